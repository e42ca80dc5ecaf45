use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info};

use respline::{Command, Config, Connection};

type Error = Box<dyn std::error::Error + Send + Sync>;

const PORT: u16 = 6379;

#[derive(Parser, Debug)]
#[command(name = "respline-cli", about = "Send commands to a RESP server, one per line")]
struct Args {
    /// Server hostname
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "RESPLINE_HOST")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = PORT, env = "RESPLINE_PORT")]
    port: u16,

    /// Read and write timeout in milliseconds, 0 waits forever
    #[arg(short, long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout((ms > 0).then(|| Duration::from_millis(ms)));
    }

    // Dialing is the caller's business, the library only speaks the protocol.
    let stream = TcpStream::connect((args.host.as_str(), args.port)).await?;
    let mut conn = Connection::with_config(stream, config);
    let addr = format!("{}:{}", args.host, args.port);
    info!("Connected to {}", addr);

    let mut stdout = tokio::io::stdout();
    let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    loop {
        prompt(&mut stdout, &addr).await?;
        let Some(line) = lines.next().await else {
            break;
        };
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        if name.eq_ignore_ascii_case("quit") || name.eq_ignore_ascii_case("exit") {
            break;
        }

        let cmd = Command::new(name).args(parts);
        let reply = conn.send(&cmd).await?;
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
    }

    conn.close().await?;
    Ok(())
}

async fn prompt<W: AsyncWrite + Unpin>(out: &mut W, addr: &str) -> std::io::Result<()> {
    out.write_all(format!("{}> ", addr).as_bytes()).await?;
    out.flush().await
}
