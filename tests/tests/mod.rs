mod cli;
mod hard_copy;
mod safe_copy;
mod scanner;
