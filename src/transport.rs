//! Picks the transport for a stream and defines the stage-facing traits.

use std::{sync::Arc, time::Duration};

use crate::{
    cancellation::Cancellation,
    channel::{Receiver, Sender},
    config::StreamConfig,
    error::NetError,
    log::LogSink,
    rtp, sink_info, tcp,
    unit::Unit,
    url::Protocol,
};

/// Upper bound on a channel wait inside transport loops, so cancellation is
/// noticed promptly.
pub const RECV_TIMEOUT: Duration = Duration::from_millis(50);

/// Drains units from the encoder side onto the network.
pub trait UnitSender: Send {
    fn run(&mut self, units: Receiver<Unit>) -> Result<(), NetError>;
}

/// Feeds units read from the network to the decoder side.
pub trait UnitReceiver: Send {
    fn run(&mut self, units: Sender<Unit>) -> Result<(), NetError>;
}

/// Collaborators handed to every transport.
#[derive(Clone)]
pub struct Context {
    pub logger: Arc<dyn LogSink>,
    pub config: StreamConfig,
    pub running: Cancellation,
}

impl Context {
    pub fn new(logger: Arc<dyn LogSink>, config: StreamConfig, running: Cancellation) -> Self {
        Self {
            logger,
            config,
            running,
        }
    }
}

pub fn create_sender(context: &Context) -> Result<Box<dyn UnitSender>, NetError> {
    let url = &context.config.url;
    let addr = url.resolve()?;
    sink_info!(context.logger, "Resolved {}:{} to {}", url.host(), url.port(), addr);

    let logger = Arc::clone(&context.logger);
    let running = context.running.clone();
    Ok(match url.protocol() {
        Protocol::Tcp if context.config.p2p => {
            Box::new(tcp::P2PSender::bind(addr, logger, running)?)
        }
        Protocol::Tcp => Box::new(tcp::PacketSender::new(addr, logger, running)),
        Protocol::Rtp => Box::new(rtp::PacketSender::connect(
            addr,
            context.config.mtu,
            logger,
            running,
        )?),
    })
}

pub fn create_receiver(context: &Context) -> Result<Box<dyn UnitReceiver>, NetError> {
    let url = &context.config.url;
    let addr = url.resolve()?;
    sink_info!(context.logger, "Resolved {}:{} to {}", url.host(), url.port(), addr);

    let logger = Arc::clone(&context.logger);
    let running = context.running.clone();
    Ok(match url.protocol() {
        Protocol::Tcp => Box::new(tcp::PacketReceiver::new(addr, logger, running)),
        Protocol::Rtp => Box::new(rtp::PacketReceiver::bind(addr, logger, running)?),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::{log::NoopLogSink, url::Url};

    fn context(url: &str, p2p: bool) -> Context {
        let mut config = StreamConfig::new(Url::parse(url).unwrap());
        config.p2p = p2p;
        Context::new(Arc::new(NoopLogSink), config, Cancellation::new())
    }

    #[test]
    fn test_every_protocol_has_a_sender() {
        create_sender(&context("tcp://127.0.0.1:9", false)).unwrap();
        create_sender(&context("tcp://127.0.0.1:0", true)).unwrap();
        create_sender(&context("rtp://127.0.0.1:9", false)).unwrap();
    }

    #[test]
    fn test_every_protocol_has_a_receiver() {
        create_receiver(&context("tcp://127.0.0.1:9", false)).unwrap();
        create_receiver(&context("rtp://127.0.0.1:0", false)).unwrap();
    }
}
