use ort::execution_providers::ExecutionProviderDispatch;

/// Execution providers to register ahead of the implicit CPU provider, with a
/// label for log output.
pub fn preferred_execution_providers() -> (&'static str, Vec<ExecutionProviderDispatch>) {
    #[cfg(target_os = "macos")]
    {
        (
            "CoreML",
            vec![ort::execution_providers::CoreMLExecutionProvider::default().build()],
        )
    }
    #[cfg(target_os = "windows")]
    {
        (
            "DirectML",
            vec![ort::execution_providers::DirectMLExecutionProvider::default().build()],
        )
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        ("CPU", vec![])
    }
}
