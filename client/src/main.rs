use clap::Parser;
use client::{parse_command, ClientError, ClientModel, Command, ConsoleView, NetworkClient};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Console client for the shared Place canvas")]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Name to log in with
    #[arg(short, long)]
    username: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut model = ClientModel::new();
    model.add_observer(ConsoleView::new(std::io::stdout()));

    let addr = (args.host.as_str(), args.port);
    let mut client = match NetworkClient::connect(addr, &args.username, model).await {
        Ok(client) => client,
        Err(ClientError::Rejected(reason)) => {
            eprintln!("Login rejected: {}", reason);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    info!("Connected to {} as {}", client.server_addr(), client.username());

    let mut receive = client.start_receive_loop()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = &mut receive => {
                eprintln!("\nDisconnected from server");
                std::process::exit(1);
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };

                match parse_command(&line) {
                    Ok(Some(Command::Paint { row, col, color })) => {
                        client.paint(row, col, color).await?;
                    }
                    Ok(Some(Command::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }

    client.disconnect().await;
    Ok(())
}
