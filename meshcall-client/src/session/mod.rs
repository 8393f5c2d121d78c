mod room_session;
mod session_command;
mod session_event;
mod session_handle;

pub use room_session::{RoomSession, SessionDeps};
pub use session_command::SessionCommand;
pub use session_event::{RelayStatus, SessionEvent, SessionSnapshot};
pub use session_handle::SessionHandle;
