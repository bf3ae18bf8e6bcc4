use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the fatal conditions that can occur while lifting a decoded
/// instruction section into CFG form or while running a rewrite pass. Recoverable
/// per-site conditions (unsupported instructions during lifting, pass sites that
/// decline to rewrite) are *not* errors: the former surface as [`crate::lift::Diagnostic`]
/// records, the latter as counts in [`crate::passes::PassReport`].
///
/// # Error Categories
///
/// ## Malformed Input
/// - [`Error::Malformed`] - The decoded section violates the decoder contract
///   (out-of-range register index, malformed labels)
/// - [`Error::Empty`] - Empty program or empty instruction section
///
/// ## Internal Consistency
/// - [`Error::Internal`] - A lifter or pass invariant was violated (jump target
///   not at a discovered block boundary, pass precondition broken). These
///   indicate a bug in this crate or its caller, not bad input.
///
/// # Examples
///
/// ```rust
/// use bpflift::{bytecode::Program, lift::Lifter, Error};
///
/// match Lifter::lift(&Program::new(vec![])) {
///     Ok(lifted) => println!("{}", lifted.function()),
///     Err(Error::Empty) => eprintln!("nothing to lift"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed section: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The decoded instruction section is damaged and cannot be lifted.
    ///
    /// The decoder is trusted to produce valid register indices and label
    /// offsets; when that contract is broken, lifting of the section aborts
    /// with this error rather than corrupting the function under construction.
    /// The error includes the source location where the malformation was
    /// detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An internal consistency invariant was violated.
    ///
    /// Raised for conditions that can only arise from a bug: a jump target
    /// that does not land on a discovered block boundary, or a rewrite pass
    /// invoked on IR that breaks a pass precondition (e.g. a generic load
    /// whose result has zero uses).
    #[error("Internal invariant violated: {0}")]
    Internal(String),

    /// Empty input provided.
    ///
    /// A program with no sections, or a first section with no instructions,
    /// has nothing to lift.
    #[error("Empty input provided!")]
    Empty,
}
