//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to the enum, if known.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Lifecycle of a retryable stage row (classifications and answers
    /// share the same shape).
    ///
    /// `Pending` and `Retry` are the only states re-dispatch is valid
    /// from; `Completed` is terminal and short-circuits re-entry.
    ProcessingStatus {
        Pending = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
        Retry = 5,
    }
}

define_status_enum! {
    /// Execution status of a queued task.
    TaskStatus {
        Pending = 1,
        Running = 2,
        Completed = 3,
        Failed = 4,
    }
}

impl ProcessingStatus {
    /// Whether a classification in this state still needs (re)triggering.
    pub fn needs_classification(id: Option<StatusId>) -> bool {
        id != Some(ProcessingStatus::Completed.id())
    }
}
