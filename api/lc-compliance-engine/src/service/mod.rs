pub mod case_lifecycle_service;
pub mod chain_hash_service;
pub mod chain_verify_service;
pub mod discrepancy_service;
pub mod field_match_service;
pub mod integrity_hash_service;
