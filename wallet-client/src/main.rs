use naija_network::StacksClient;
use naija_transfer::{
    console, service, view, AppState, Command, Config, ContractApi, ServiceEvent, UiEvent,
    WatchOnlyWallet,
};
use std::io::BufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Forward stdin lines from a detached thread, so a pending read never holds
/// up runtime shutdown
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Could not read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Print the current frame unless it is unchanged
fn draw(state: &AppState, last_frame: &mut String) {
    let frame = view::render(state, chrono::Utc::now());
    if frame != *last_frame {
        println!("{}", frame);
        *last_frame = frame;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::load()?;
    config.validate()?;

    let client = StacksClient::new(config.stacks_network()?, config.api_url.clone())?;
    let api = ContractApi::new(client, config.contract_id()?);
    let watch_address = config.watch_address()?;
    let wallet = WatchOnlyWallet::new(watch_address);

    let token = CancellationToken::new();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (svc_tx, mut svc_rx) = mpsc::unbounded_channel();

    let service = tokio::spawn(service::run(
        token.clone(),
        ui_rx,
        svc_tx,
        config.clone(),
        api,
        wallet,
    ));

    if watch_address.is_some() {
        ui_tx.send(UiEvent::ConnectWallet)?;
    } else {
        log::info!("No stx_address configured; showing the exchange rate only");
    }

    let mut state = AppState::new(&config);
    let mut last_frame = String::new();
    let mut input = spawn_input_reader();
    let mut input_open = true;
    println!("{}\n", console::HELP);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("🛑 Interrupted");
                break;
            }

            event = svc_rx.recv() => {
                let Some(event) = event else { break };
                let connected = matches!(event, ServiceEvent::Connected { .. });
                state.apply(event);
                if connected {
                    let _ = ui_tx.send(UiEvent::NavigatedTo(state.screen));
                }
                draw(&state, &mut last_frame);
            }

            line = input.recv(), if input_open => {
                let Some(line) = line else {
                    log::info!("Input closed; still syncing until Ctrl-C");
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{}", console::HELP),
                    Ok(command) => {
                        for event in console::apply(&mut state, command) {
                            let _ = ui_tx.send(event);
                        }
                    }
                    Err(e) => state.error = Some(e.to_string()),
                }
                draw(&state, &mut last_frame);
            }
        }
    }

    let _ = ui_tx.send(UiEvent::Shutdown);
    token.cancel();
    if let Err(e) = service.await {
        log::warn!("Service task ended abnormally: {}", e);
    }
    Ok(())
}
