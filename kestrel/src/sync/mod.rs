pub mod channel;
pub mod event;
pub mod interrupt_lock;
pub mod message;
pub mod mutex;

pub use channel::Channel;
pub use event::EventFlag;
pub use interrupt_lock::{InterruptLock, InterruptLockGuard, InterruptLockKey};
pub use message::Message;
pub use mutex::{Mutex, MutexGuard, RawMutex};
