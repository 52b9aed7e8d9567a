//! AMP CSS Validator Binary

use ampcss::{EnhancedCli, ValidatorError};
use std::process;

fn main() {
    let mut cli = EnhancedCli::new();

    match cli.run() {
        Ok(()) => {}
        Err(ValidatorError::ValidationFailed { failed, total }) => {
            eprintln!("{} of {} stylesheets have errors", failed, total);
            process::exit(1);
        }
        Err(ValidatorError::Io(e)) => {
            eprintln!("IO Error: {}", e);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Validation failed: {}", e);
            process::exit(2);
        }
    }
}
