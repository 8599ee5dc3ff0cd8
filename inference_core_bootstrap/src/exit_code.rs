// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Maps application results to conventional Unix exit codes (`sysexits.h`),
//! so scripts driving the CLI can distinguish usage errors from runtime
//! failures without parsing stderr.

use inference_core::InferenceError;

/// Process exit codes following the BSD `sysexits.h` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Successful termination.
    Ok = 0,
    /// Catchall for general errors.
    GeneralError = 1,
    /// Command line usage error.
    Usage = 64,
    /// Input data was incorrect in some way.
    DataError = 65,
    /// Required device or resource unavailable.
    Unavailable = 69,
    /// Internal software error.
    Software = 70,
    /// Temporary failure, the caller is invited to retry.
    TempFail = 75,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps a domain error to the exit code a CLI caller should observe.
pub fn map_error_to_exit_code(error: &InferenceError) -> ExitCode {
    match error {
        InferenceError::InvalidInput(_) => ExitCode::DataError,
        InferenceError::NotInitialized(_) => ExitCode::Software,
        InferenceError::QueueFull(_) | InferenceError::Timeout(_) => ExitCode::TempFail,
        InferenceError::DeviceUnavailable(_) | InferenceError::AllDevicesFailed(_) => ExitCode::Unavailable,
        InferenceError::OutOfMemory(_) => ExitCode::Unavailable,
        InferenceError::PolicyDenied(_) => ExitCode::DataError,
        InferenceError::InferenceFailed(_) => ExitCode::GeneralError,
        InferenceError::Cancelled(_) => ExitCode::Ok,
        InferenceError::InternalError(_) => ExitCode::Software,
    }
}

/// Converts a top-level application result into a process exit code,
/// printing the error to stderr on failure.
pub fn result_to_exit_code(result: Result<(), InferenceError>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Ok.into(),
        Err(err) => {
            eprintln!("error: {err}");
            map_error_to_exit_code(&err).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_not_an_error_exit() {
        assert_eq!(map_error_to_exit_code(&InferenceError::cancelled("stopped")), ExitCode::Ok);
    }

    #[test]
    fn queue_full_maps_to_tempfail_for_retry() {
        assert_eq!(map_error_to_exit_code(&InferenceError::queue_full("full")), ExitCode::TempFail);
    }

    #[test]
    fn result_to_exit_code_success_does_not_panic() {
        let _code: std::process::ExitCode = result_to_exit_code(Ok(()));
    }
}
