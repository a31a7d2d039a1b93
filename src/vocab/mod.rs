mod names;
mod wheel_name;

// All this stuff is also re-exported from crate::prelude::*

pub use self::names::{GroupName, PackageName};
pub use self::wheel_name::WheelName;
