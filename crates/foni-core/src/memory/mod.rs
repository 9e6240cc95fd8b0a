pub mod layout;
mod process;
mod reader;

// Mock address space for unit and integration tests
#[doc(hidden)]
pub mod mock;

pub use process::{ProcessHandle, ProcessIdentity};
pub use reader::{ReadMemory, WriteMemory};

#[doc(hidden)]
pub use mock::{MockMemory, MockMemoryBuilder};
