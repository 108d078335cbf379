pub mod recheck;
