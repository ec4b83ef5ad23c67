//! ICE-lite: gathers one candidate of each kind we can find, no connectivity
//! checks and no pairing.

pub mod gathering_service;
pub mod ice_error;
pub mod port_forwarding;
pub mod resolver;
pub mod type_ice;

pub use gathering_service::gather_candidates;
pub use ice_error::IceError;
pub use port_forwarding::{NoPortForwarding, PortForwarder, UpnpForwarder};
pub use resolver::{Resolver, SystemResolver};
pub use type_ice::{candidate::Candidate, candidate_type::CandidateType};
