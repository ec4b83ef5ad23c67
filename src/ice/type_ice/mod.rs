pub mod candidate;
pub mod candidate_type;
