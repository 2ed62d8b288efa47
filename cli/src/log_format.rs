//! Plain-text event formatter for the log file.
//!
//! Each line carries the id of the REPL turn that produced it (the root span) and the span path
//! with its fields, so all events of one user turn can be grepped together.

use std::fmt;

use tracing_core::Subscriber;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Output: `TIMESTAMP LEVEL turn_id=R span{fields}:child{fields}: target: event_fields`.
///
/// Events outside any span have no `turn_id` or span path.
#[derive(Default)]
pub struct TurnFormat {
    timer: SystemTime,
}

impl TurnFormat {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, N> FormatEvent<S, N> for TurnFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing_core::Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        write!(writer, " {}", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            let mut spans = scope.from_root().peekable();
            if let Some(root) = spans.peek() {
                write!(writer, " turn_id={}", root.id().into_u64())?;
            }
            write!(writer, " ")?;
            for span in spans {
                write!(writer, "{}", span.name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{}}}", fields)?;
                    }
                }
                write!(writer, ":")?;
            }
        }

        write!(writer, " {}: ", event.metadata().target())?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
