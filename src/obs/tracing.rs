// self
use crate::{_prelude::*, obs::Operation};

/// Future returned by [`OperationSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OperationSpan::instrument`]; the input itself without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// Span covering one login or signing call.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// `stage` names the entry point, e.g. `ptc_login` or `sign`.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("pogo_auth.operation", operation = operation.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Retry and degraded-path notices.
pub fn warn(operation: Operation, message: impl Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation = operation.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, message);
	}
}

/// Diagnostic notices.
pub fn debug(operation: Operation, message: impl Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = operation.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn events_accept_formatted_messages() {
		warn(Operation::Login, format_args!("Login attempt {}/{} failed. Retrying.", 1, 5));
		debug(Operation::Hash, "Hash quota exhausted; waiting for the period to reset.");
	}

	#[tokio::test]
	async fn instrumented_call_keeps_its_output() {
		let span = OperationSpan::new(Operation::Hash, "sign");
		let status = span.instrument(async { Some(200_u16) }).await;

		assert_eq!(status, Some(200));
	}
}
