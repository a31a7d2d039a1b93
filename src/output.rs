use crate::prelude::*;
use std::fmt::Debug;

use console::{Emoji, Style, StyledObject};
use tracing::{
    field::{Field, Visit},
    metadata::LevelFilter,
    span::Attributes,
    Event, Id, Level, Subscriber,
};
use tracing_subscriber::{
    filter::{EnvFilter, Targets},
    layer::{Context, Layer},
    prelude::*,
    registry::{LookupSpan, SpanRef},
};

use clap::{Args, ValueEnum};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Increase verbosity. (Can be repeated.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Reduce verbosity. (Can be repeated.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,
    /// When to use colored output
    #[arg(long, default_value_t = ColorChoice::Auto, value_enum, value_name = "WHEN", global = true)]
    color: ColorChoice,
}

impl OutputArgs {
    pub fn is_verbose(&self) -> bool {
        self.verbose > self.quiet
    }

    fn level(&self) -> Level {
        let verbosity = i8::try_from(self.verbose)
            .unwrap_or(i8::MAX)
            .saturating_sub(i8::try_from(self.quiet).unwrap_or(i8::MAX));

        match verbosity {
            2.. => Level::TRACE,
            1 => Level::DEBUG,
            0 => Level::INFO,
            -1 => Level::WARN,
            // https://github.com/rust-lang/rust/issues/67264
            i8::MIN..=-2 => Level::ERROR,
        }
    }
}

struct UILayer;

struct WithMessage<'a, F>(&'a F)
where
    F: Fn(&dyn Debug);

impl<'a, F> Visit for WithMessage<'a, F>
where
    F: Fn(&dyn Debug),
{
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            (self.0)(value);
        }
    }
}

struct MessageAsString(String);

static WARNING: Lazy<StyledObject<Emoji<'static, 'static>>> = Lazy::new(|| {
    Style::new()
        .yellow()
        .bold()
        .for_stderr()
        .apply_to(Emoji("⚠️  Warning:", "Warning:"))
});

static ERROR: Lazy<StyledObject<Emoji<'static, 'static>>> = Lazy::new(|| {
    Style::new()
        .red()
        .bold()
        .for_stderr()
        .apply_to(Emoji("🛑  Error:", "Error:"))
});

fn collect_context<S>(leaf: Option<SpanRef<S>>) -> Vec<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(leaf) = leaf {
        leaf.scope()
            .from_root()
            .filter_map(|span| {
                span.extensions()
                    .get::<MessageAsString>()
                    .map(|m| m.0.clone())
            })
            .collect()
    } else {
        vec![]
    }
}

pub fn current_context() -> Vec<String> {
    tracing::dispatcher::get_default(|dispatch| {
        if let Some(registry) = dispatch.downcast_ref::<tracing_subscriber::Registry>()
        {
            // NB: can't use Span::current_span() here, because that has to re-fetch the
            // current dispatcher, and while we're inside a dispatcher::get_default call
            // we temporarily *own* that dispatcher and the current dispatcher gets set
            // to None instead.
            if let Some(leaf_id) = registry.current_span().id() {
                return collect_context(registry.span(leaf_id));
            }
        }
        vec![]
    })
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for UILayer {
    /// For every context!(...) span, render the message into a String and stash it
    /// inside the tracing_subscriber registry entry for this Span.
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let span = ctx.span(id).expect("span should already exist!");
        if span.metadata().target() == CONTEXT_TARGET {
            attrs.record(&mut WithMessage(&|msg| {
                let as_string = MessageAsString(format!("{:?}", msg));
                span.extensions_mut().insert(as_string);
            }));
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        event.record(&mut WithMessage(&|msg| match *event.metadata().level() {
            Level::ERROR => eprintln!("{} {:?}", &*ERROR, msg),
            Level::WARN => eprintln!("{} {:?}", &*WARNING, msg),
            _ => eprintln!("{:?}", msg),
        }));
    }
}

pub const CONTEXT_TARGET: &str = "pybundle::context";
pub const DEBUG_ENV_VAR: &str = "PYBUNDLE_DEBUG";
pub const BACKTRACE_ENV_VAR: &str = "PYBUNDLE_BACKTRACE";

/// Attach a description of what we're doing to any error reported before the
/// enclosing block ends, e.g. `context!("reading {}", path.display());`
#[macro_export]
macro_rules! context {
    ($($arg:tt)*) => {
        let _guard = tracing::span!(target: "pybundle::context", tracing::Level::ERROR, "context", $($arg)*).entered();
    }
}

struct BundleEyreHandler {
    context: Vec<String>,
    backtrace: Option<backtrace::Backtrace>,
}

impl BundleEyreHandler {
    fn new() -> BundleEyreHandler {
        BundleEyreHandler {
            context: current_context(),
            backtrace: std::env::var_os(BACKTRACE_ENV_VAR)
                .map(|_| backtrace::Backtrace::new_unresolved()),
        }
    }
}

impl eyre::EyreHandler for BundleEyreHandler {
    fn debug(
        &self,
        error: &(dyn std::error::Error + 'static),
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        write!(f, "{}", error)?;
        let mut source = error.source();
        while let Some(cause) = source {
            write!(f, "\n  caused by: {}", cause)?;
            source = cause.source();
        }
        // innermost first, like the causes
        for context in self.context.iter().rev() {
            write!(f, "\n  while {}", context)?;
        }
        if let Some(backtrace) = &self.backtrace {
            // clone to make it mutable so we can resolve symbols
            let mut backtrace = backtrace.clone();
            backtrace.resolve();
            write!(f, "\n\nBacktrace:\n{backtrace:?}")?;
        }
        Ok(())
    }
}

pub fn init(args: &OutputArgs) -> Result<()> {
    eyre::set_hook(Box::new(|_| Box::new(BundleEyreHandler::new())))?;

    match args.color {
        ColorChoice::Auto => (),
        ColorChoice::Always => console::set_colors_enabled_stderr(true),
        ColorChoice::Never => console::set_colors_enabled_stderr(false),
    }

    let s = tracing_subscriber::registry()
        .with(UILayer.with_filter(Targets::new().with_target("pybundle", args.level())))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(LevelFilter::OFF.into())
                        .with_env_var(DEBUG_ENV_VAR)
                        .from_env_lossy(),
                ),
        );
    s.try_init()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        output: OutputArgs,
    }

    fn level(args: &[&str]) -> Level {
        let cli = Cli::try_parse_from(std::iter::once("pybundle").chain(args.iter().copied()))
            .unwrap();
        cli.output.level()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(&[]), Level::INFO);
        assert_eq!(level(&["-v"]), Level::DEBUG);
        assert_eq!(level(&["-vvv"]), Level::TRACE);
        assert_eq!(level(&["-q"]), Level::WARN);
        assert_eq!(level(&["-qq"]), Level::ERROR);
        assert_eq!(level(&["-vq"]), Level::INFO);
    }

    #[test]
    fn test_context_without_subscriber() {
        context!("doing {}", "nothing");
        assert!(current_context().is_empty());
    }
}
