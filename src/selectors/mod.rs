pub mod read_preference;
pub mod selector;

pub use read_preference::ReadPreferenceServerSelector;
pub use selector::ServerSelector;
