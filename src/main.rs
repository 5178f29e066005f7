//! X1C3 tracker configuration utility
//! Reads, edits and writes the tracker's configuration block over a serial port

use anyhow::Context;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};
use x1c3_rs::editor::{self, MENUS};
use x1c3_rs::record::{self, FieldId, RawRecord};
use x1c3_rs::serial::{list_ports, DevicePort, SerialConfig, Transport};
use x1c3_rs::ConfigStore;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!("\nCommands:");
    eprintln!("  ports                          List serial ports");
    eprintln!("  version <port>                 Show firmware version and battery voltage");
    eprintln!("  read <port> <file>             Download the configuration into a file");
    eprintln!("  write <port> <file>            Upload a configuration file");
    eprintln!("  dump-device <port> <file>      Save the raw block and print a hex dump");
    eprintln!("  dump-file <file>               Print a hex dump of a configuration file");
    eprintln!("  show <file>                    Print decoded settings");
    eprintln!("  json <file>                    Print decoded settings as JSON");
    eprintln!("  set <file> <field> <value>     Change one setting in a file");
    eprintln!("  edit <file> [port]             Edit a file through the menus");
    eprintln!("\nExample: {} read /dev/ttyUSB0 tracker.sav", program);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("x1c3-tool");
    let rest: Vec<&str> = args.iter().skip(2).map(String::as_str).collect();

    match (args.get(1).map(String::as_str), rest.as_slice()) {
        (Some("ports"), []) => ports(),
        (Some("version"), [port]) => version(port).await,
        (Some("read"), [port, file]) => read(port, file).await,
        (Some("write"), [port, file]) => write(port, file).await,
        (Some("dump-device"), [port, file]) => dump_device(port, file).await,
        (Some("dump-file"), [file]) => dump_file(file),
        (Some("show"), [file]) => show(file),
        (Some("json"), [file]) => json(file),
        (Some("set"), [file, field, value]) => set(file, field, value),
        (Some("edit"), [file]) => edit(file, None).await,
        (Some("edit"), [file, port]) => edit(file, Some(port)).await,
        _ => usage(program),
    }
}

fn transport(port: &str) -> Transport<DevicePort> {
    Transport::new(DevicePort::new(port, SerialConfig::default()))
}

fn load(file: &str) -> anyhow::Result<ConfigStore> {
    let mut store = ConfigStore::new();
    store
        .load_file(file)
        .with_context(|| format!("Failed to load {}", file))?;
    if store.is_partial() {
        println!("Warning: some settings in {} could not be decoded", file);
    }
    Ok(store)
}

fn ports() -> anyhow::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

async fn version(port: &str) -> anyhow::Result<()> {
    let info = transport(port).version().await?;
    println!("Firmware: {}", info.firmware);
    println!("Battery:  {}", info.voltage);
    Ok(())
}

async fn read(port: &str, file: &str) -> anyhow::Result<()> {
    let transport = transport(port);
    let mut store = ConfigStore::new();

    store
        .identify(&transport)
        .await
        .context("Device did not answer the version query")?;
    store.fetch(&transport).await?;
    if store.is_partial() {
        println!("Warning: some settings could not be decoded and keep their raw bytes");
    }
    // Saved as received; only edits re-encode the block
    store.save_template(file)?;

    println!("Saved configuration to {}", file);
    Ok(())
}

async fn write(port: &str, file: &str) -> anyhow::Result<()> {
    let transport = transport(port);
    let mut store = load(file)?;

    store
        .identify(&transport)
        .await
        .context("Device did not answer the version query")?;
    let ack = store.send(&transport).await?;

    println!("Configuration written, device answered {:#04x}", ack);
    Ok(())
}

async fn dump_device(port: &str, file: &str) -> anyhow::Result<()> {
    let raw = transport(port).fetch().await?;

    // Saved verbatim, malformed or not
    fs::write(file, raw.as_bytes()).with_context(|| format!("Failed to write {}", file))?;
    println!("{}", raw.printable());
    println!("Saved {} bytes to {}", raw.len(), file);
    Ok(())
}

fn dump_file(file: &str) -> anyhow::Result<()> {
    let data = fs::read(file).with_context(|| format!("Failed to read {}", file))?;
    let raw = RawRecord::new(data);
    println!("{}", raw.printable());
    if let Err(e) = raw.validate() {
        println!("Warning: {}", e);
    }
    Ok(())
}

fn show(file: &str) -> anyhow::Result<()> {
    let store = load(file)?;
    let model = store.model().context("No configuration loaded")?;

    for menu in MENUS {
        println!("\n[{}]", menu.title);
        for line in menu.render(model) {
            println!("{}", line);
        }
    }
    println!("\nFrequency command: {:?}", record::frequency_command(model));
    Ok(())
}

fn json(file: &str) -> anyhow::Result<()> {
    let store = load(file)?;
    let model = store.model().context("No configuration loaded")?;
    println!("{}", serde_json::to_string_pretty(model)?);
    Ok(())
}

fn set(file: &str, field: &str, value: &str) -> anyhow::Result<()> {
    let id = FieldId::from_name(field).with_context(|| format!("Unknown field {:?}", field))?;
    let prompt = editor::prompt_for(id).with_context(|| format!("{} is not editable", id))?;

    let mut store = load(file)?;
    let model = store.model_mut().context("No configuration loaded")?;
    prompt.apply(model, value)?;
    let shown = prompt.display(model);

    store.save_file(file)?;
    println!("{} = {}", id, shown);
    Ok(())
}

async fn edit(file: &str, port: Option<&str>) -> anyhow::Result<()> {
    let mut store = if Path::new(file).exists() {
        load(file)?
    } else {
        let mut store = ConfigStore::new();
        store.load(RawRecord::blank())?;
        println!("{} not found, starting from a blank configuration", file);
        store
    };

    if let Some(port) = port {
        let info = store.identify(&transport(port)).await?;
        println!("Firmware {}, battery {}", info.firmware, info.voltage);
    }

    let model = store.model_mut().context("No configuration loaded")?;
    let stdin = io::stdin();
    let changes = editor::run(model, &mut stdin.lock(), &mut io::stdout())?;

    if changes == 0 {
        println!("No changes");
        return Ok(());
    }
    store.save_file(file)?;
    println!("Saved {} change(s) to {}", changes, file);
    Ok(())
}
