//! x11client - demo entry point
//!
//! Connects to a local X server, reports what it negotiated and, unless asked
//! only to list extensions, opens a window and logs the events it receives.

use std::env;
use std::process;

use x11client::connection::DisplayName;
use x11client::protocol::{event_mask, Rectangle, VisualID};
use x11client::{Client, EventCallbacks, Window, VERSION};

fn print_usage() {
    println!("x11client v{}", VERSION);
    println!("An asynchronous X11 protocol client");
    println!();
    println!("Usage: x11client [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -display, --display <name>   Display to connect to (default: $DISPLAY)");
    println!("  -list-extensions             Print the negotiated extensions and exit");
    println!("  -h, --help                   Show this help message");
    println!();
    println!("Examples:");
    println!("  x11client -display :0");
    println!("  RUST_LOG=debug x11client -list-extensions");
    println!();
}

#[derive(Debug, Default)]
struct Config {
    display: Option<String>,
    list_extensions: bool,
}

fn parse_args() -> Result<Config, String> {
    let mut config = Config::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-list-extensions" => {
                config.list_extensions = true;
            }
            "-display" | "--display" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -display".to_string());
                }
                config.display = Some(args[i].clone());
            }
            arg => {
                return Err(format!("Unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn event_logger() -> EventCallbacks {
    EventCallbacks {
        expose: Some(Box::new(|_, e| {
            log::info!("Expose {} {}x{}+{}+{}", e.window, e.width, e.height, e.x, e.y)
        })),
        configure_notify: Some(Box::new(|_, e| {
            log::info!("ConfigureNotify {} {}x{}", e.window, e.width, e.height)
        })),
        map_notify: Some(Box::new(|_, e| log::info!("MapNotify {}", e.window))),
        key_press: Some(Box::new(|_, e| {
            log::info!("KeyPress keycode={} state=0x{:x}", e.detail, e.state)
        })),
        button_press: Some(Box::new(|_, e| {
            log::info!("ButtonPress button={} at {},{}", e.detail, e.event_x, e.event_y)
        })),
        unknown_event: Some(Box::new(|_, code| log::debug!("Unhandled event code {}", code))),
        unknown_generic_event: Some(Box::new(|_, major, event_type| {
            log::debug!("Unhandled generic event {} from opcode {}", event_type, major)
        })),
        error: Some(Box::new(|_, e| log::warn!("{}", e))),
        ..Default::default()
    }
}

/// Open a window on the first screen once the connection is ready
fn open_window(client: &mut Client) -> x11client::X11Result<Window> {
    let (root, depth) = match client.setup().and_then(|s| s.screen(0)) {
        Some(screen) => (screen.root, screen.root_depth),
        None => return Err(x11client::ClientError::Connection("server has no screens".into())),
    };
    let window = Window::from(client.generate_id());
    client.create_window(
        window,
        root,
        depth,
        Rectangle::new(0, 0, 640, 480),
        VisualID::COPY_FROM_PARENT,
        event_mask::EXPOSURE
            | event_mask::STRUCTURE_NOTIFY
            | event_mask::KEY_PRESS
            | event_mask::BUTTON_PRESS,
    )?;
    client.map_window(window)?;
    Ok(window)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let display = match config.display.as_deref() {
        Some(name) => DisplayName::parse(name),
        None => DisplayName::from_env(),
    };
    let display = match display {
        Ok(display) => display,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    log::info!("x11client v{}", VERSION);
    log::info!("Display: {}", display);

    let (mut client, mut reader) = match Client::open(&display) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Error: Failed to connect to {}: {}", display, e);
            process::exit(1);
        }
    };

    let list_only = config.list_extensions;
    let connected = client.connect(move |client, result| {
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        if list_only {
            for extension in client.extensions().iter() {
                let version = client
                    .extensions()
                    .version(extension.name())
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!("{} (opcode {}, version {})", extension.name(), extension.major_opcode(), version);
            }
            client.close();
            return;
        }
        client.set_event_callbacks(event_logger());
        match open_window(client) {
            Ok(window) => log::info!("Created window {}", window),
            Err(e) => log::error!("Failed to create window: {}", e),
        }
    });
    if let Err(e) = connected {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    loop {
        match reader.read_into(&mut client) {
            Ok(true) if client.state() == x11client::ConnectionState::Closed => break,
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
}
