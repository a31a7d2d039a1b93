/// Figuring out which wheels can be installed into a bundle built for some *other*
/// machine. This is similar to what 'packaging.tags' does, but with a key difference:
///
/// - For 'packaging.tags', the question is "what wheels can run on this interpreter
///   that I've already installed?" So it pokes at the running interpreter and the
///   running system to find out.
///
///   Our question is "what wheels could run on the machine this bundle is going to be
///   copied to?" The user tells us the platform (e.g. `manylinux_2_28_x86_64`) and we
///   know the interpreter's implementation and version from the environment we
///   created, so everything here is a pure function of those inputs. Nothing looks at
///   the host.
mod expand;
mod interpreter;
mod macos;
mod platform;
mod platform_tag;

pub use expand::expand_platform_tag;
pub use interpreter::Interpreter;
pub use platform::{supported_tags, SupportedTags};
