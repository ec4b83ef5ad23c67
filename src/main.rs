use std::{
    env, fs,
    io::{self, BufWriter, Write},
    net::{Ipv4Addr, UdpSocket},
    path::Path,
    process::ExitCode,
    sync::{Arc, mpsc},
    time::Duration,
};

use rustyshare::{
    cancellation::Cancellation,
    channel::{SendError, channel},
    config::{Config, ConfigError, StreamConfig},
    error::NetError,
    ice::{NoPortForwarding, PortForwarder, SystemResolver, UpnpForwarder, gather_candidates},
    log::{LogSink, Logger},
    sink_info, sink_warn,
    stage::{Stage, StageError},
    transport::{Context, create_receiver, create_sender},
    unit::{Unit, split_access_units},
};
use thiserror::Error;

const LOG_CHANNEL_CAPACITY: usize = 4096;

#[derive(Debug, Error)]
enum AppError {
    #[error("usage: rustyshare (send|receive) <config.ini> <file.h264>")]
    Usage,
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("failed to start stage: {0}")]
    Spawn(io::Error),
    #[error(transparent)]
    Stage(#[from] StageError),
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.as_slice() {
        [mode, config, file] if mode == "send" => send(Path::new(config), Path::new(file)),
        [mode, config, file] if mode == "receive" => receive(Path::new(config), Path::new(file)),
        _ => Err(AppError::Usage),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rustyshare: {e}");
            ExitCode::FAILURE
        }
    }
}

fn start_logger(config: &Config, stream: &StreamConfig) -> Logger {
    match &stream.log_dir {
        Some(dir) => Logger::start_in_dir(dir, Some("rustyshare"), LOG_CHANNEL_CAPACITY),
        None => Logger::start_from_config(Some("rustyshare"), LOG_CHANNEL_CAPACITY, config),
    }
}

fn load(path: &Path) -> Result<(Config, StreamConfig), AppError> {
    let config = Config::load(path)?;
    let stream = StreamConfig::from_config(&config)?;
    Ok((config, stream))
}

fn file_error(path: &Path) -> impl FnOnce(io::Error) -> AppError + '_ {
    move |source| AppError::File {
        path: path.display().to_string(),
        source,
    }
}

fn send(config_path: &Path, input: &Path) -> Result<(), AppError> {
    let (config, stream) = load(config_path)?;
    let data = fs::read(input).map_err(file_error(input))?;
    let units = split_access_units(&data, stream.fps);

    let logger = start_logger(&config, &stream);
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());
    sink_info!(sink, "[Main] {} access units from {}", units.len(), input.display());

    if stream.p2p {
        print_candidates(&stream, &sink);
    }

    let running = Cancellation::new();
    let context = Context::new(Arc::clone(&sink), stream.clone(), running.clone());
    let mut sender = create_sender(&context)?;

    let (errors_tx, errors_rx) = mpsc::channel();
    let (tx, rx) = channel::<Unit>(stream.channel_capacity);
    let mut stage = Stage::spawn("sender", Arc::clone(&sink), errors_tx, move || sender.run(rx))
        .map_err(AppError::Spawn)?;

    let frame_interval = Duration::from_secs(1) / stream.fps.max(1);
    let mut failure = None;
    for unit in units {
        if let Ok(e) = errors_rx.try_recv() {
            failure = Some(e);
            break;
        }
        if running.expired() {
            break;
        }
        if let Err(SendError(_)) = tx.send(unit) {
            break;
        }
        if running.wait_for(frame_interval) {
            break;
        }
    }
    drop(tx);
    stage.join();

    let result = match failure.or_else(|| errors_rx.try_recv().ok()) {
        Some(e) => Err(e.into()),
        None => Ok(()),
    };
    drop(sink);
    drop(context);
    logger.shutdown();
    result
}

fn receive(config_path: &Path, output: &Path) -> Result<(), AppError> {
    let (config, stream) = load(config_path)?;
    let file = fs::File::create(output).map_err(file_error(output))?;
    let mut out = BufWriter::new(file);

    let logger = start_logger(&config, &stream);
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    let running = Cancellation::new();
    let context = Context::new(Arc::clone(&sink), stream.clone(), running.clone());
    let mut receiver = create_receiver(&context)?;

    let (errors_tx, errors_rx) = mpsc::channel();
    let (tx, rx) = channel::<Unit>(stream.channel_capacity);
    let mut stage =
        Stage::spawn("receiver", Arc::clone(&sink), errors_tx, move || receiver.run(tx))
            .map_err(AppError::Spawn)?;

    let mut written = 0u64;
    let mut result = Ok(());
    while let Some(unit) = rx.receive() {
        if let Err(e) = out.write_all(unit.data()) {
            result = Err(file_error(output)(e));
            break;
        }
        written += 1;
    }
    // downstream first: stop the receiver before waiting on it
    running.cancel();
    drop(rx);
    stage.join();
    sink_info!(sink, "[Main] wrote {written} units to {}", output.display());

    if result.is_ok() {
        result = out.flush().map_err(file_error(output));
    }
    if let Ok(e) = errors_rx.try_recv() {
        result = result.and(Err(e.into()));
    }
    drop(sink);
    drop(context);
    logger.shutdown();
    result
}

/// Logs the addresses viewers can use. Gathering problems are not fatal.
fn print_candidates(stream: &StreamConfig, logger: &Arc<dyn LogSink>) {
    let socket = match UdpSocket::bind((Ipv4Addr::UNSPECIFIED, stream.url.port())) {
        Ok(socket) => socket,
        Err(e) => {
            sink_warn!(logger, "[Main] candidate socket: {e}");
            return;
        }
    };
    let forwarder: Box<dyn PortForwarder> = if stream.upnp {
        Box::new(UpnpForwarder::new())
    } else {
        Box::new(NoPortForwarding)
    };
    match gather_candidates(
        &socket,
        &SystemResolver,
        forwarder.as_ref(),
        &stream.stun_server,
        logger,
    ) {
        Ok(candidates) => {
            for c in candidates {
                println!("{c}");
            }
        }
        Err(e) => sink_warn!(logger, "[Main] candidate gathering failed: {e}"),
    }
}
