/// Database operations for the research service
pub mod dataset_repo;
pub mod patient_repo;
pub mod researcher_repo;
pub mod token_repo;
