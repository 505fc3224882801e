pub mod generate;
pub mod recipes;
pub mod run;
