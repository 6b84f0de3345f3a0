use clap::Parser;
use client::gui::{
    color_from_keys, draw_frame, lock_state, palette_slot_at, BoardLayout, GuiView, SharedGuiState,
};
use client::{ClientError, ClientModel, NetworkClient};
use log::{error, info};
use macroquad::input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton};
use macroquad::window::{next_frame, screen_height, screen_width, Conf};
use shared::Color;
use std::sync::mpsc;
use std::thread;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

#[derive(Parser, Debug)]
#[command(author, version, about = "Graphical client for the shared Place canvas")]
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

type PaintRequest = (i32, i32, Color);

fn window_conf() -> Conf {
    Conf {
        window_title: "Place".to_owned(),
        window_width: 800,
        window_height: 884,
        window_resizable: true,
        ..Default::default()
    }
}

/// Runs the connection on its own runtime so the render loop never blocks on I/O
fn spawn_network(
    args: Args,
    state: SharedGuiState,
    mut requests: UnboundedReceiver<PaintRequest>,
    status: mpsc::Sender<Result<(), String>>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                let _ = status.send(Err(format!("failed to start runtime: {}", e)));
                return;
            }
        };

        runtime.block_on(async move {
            let mut model = ClientModel::new();
            model.add_observer(GuiView::new(state.clone()));

            let addr = (args.host.as_str(), args.port);
            let mut client = match NetworkClient::connect(addr, &args.username, model).await {
                Ok(client) => client,
                Err(ClientError::Rejected(reason)) => {
                    let _ = status.send(Err(format!("login rejected: {}", reason)));
                    return;
                }
                Err(e) => {
                    let _ = status.send(Err(e.to_string()));
                    return;
                }
            };

            let mut receive = match client.start_receive_loop() {
                Ok(receive) => receive,
                Err(e) => {
                    let _ = status.send(Err(e.to_string()));
                    return;
                }
            };
            let _ = status.send(Ok(()));

            loop {
                tokio::select! {
                    _ = &mut receive => {
                        lock_state(&state).disconnected = true;
                        break;
                    }
                    request = requests.recv() => match request {
                        Some((row, col, color)) => {
                            if let Err(e) = client.paint(row, col, color).await {
                                error!("Failed to send change: {}", e);
                                lock_state(&state).disconnected = true;
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }

            client.disconnect().await;
        });
    });
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let username = args.username.clone();
    let state = SharedGuiState::default();
    let (request_tx, request_rx) = unbounded_channel();
    let (status_tx, status_rx) = mpsc::channel();

    spawn_network(args, state.clone(), request_rx, status_tx);

    match status_rx.recv() {
        Ok(Ok(())) => info!("Connected as {}", username),
        Ok(Err(reason)) => {
            eprintln!("{}", reason);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Network thread exited before connecting");
            std::process::exit(1);
        }
    }

    let mut selected = Color::Black;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        if let Some(color) = color_from_keys() {
            selected = color;
        }

        let (width, height) = (screen_width(), screen_height());
        let (mouse_x, mouse_y) = mouse_position();

        let frame = lock_state(&state);
        if frame.disconnected {
            eprintln!("Disconnected from server");
            std::process::exit(1);
        }

        let dim = frame.board.as_ref().map_or(0, |board| board.dim());
        let layout = BoardLayout::fit(width, height, dim);
        let hovered = layout.cell_at(mouse_x, mouse_y);

        if is_mouse_button_pressed(MouseButton::Left) {
            if let Some(color) = palette_slot_at(mouse_x, mouse_y, width, height) {
                selected = color;
            } else if let Some((row, col)) = hovered {
                let _ = request_tx.send((row, col, selected));
            }
        }

        draw_frame(&frame, &layout, selected, hovered, width, height);
        drop(frame);

        next_frame().await;
    }
}
