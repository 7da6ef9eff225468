pub mod add;
pub mod agenda;
pub mod delete;
pub mod done;
pub mod edit;
