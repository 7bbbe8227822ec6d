//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
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

            /// Look up a variant by its database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Return the lookup table `name` for this status.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

/// Shared `pending -> running -> {complete, error}` lifecycle.
macro_rules! impl_run_lifecycle {
    ($($name:ident),+) => {
        $(
            impl $name {
                /// `true` once no further transition is allowed.
                pub fn is_terminal(self) -> bool {
                    matches!(self, Self::Complete | Self::Error)
                }

                /// Statuses a row may be in immediately before moving to `self`.
                pub fn allowed_predecessors(self) -> &'static [$name] {
                    match self {
                        Self::Pending => &[],
                        Self::Running => &[Self::Pending],
                        Self::Complete => &[Self::Running],
                        Self::Error => &[Self::Pending, Self::Running],
                    }
                }

                /// Whether moving from `self` to `next` is a legal transition.
                pub fn can_transition_to(self, next: $name) -> bool {
                    next.allowed_predecessors().contains(&self)
                }
            }
        )+
    };
}

define_status_enum! {
    /// Mission lifecycle status.
    MissionStatus {
        Pending = 1 => "pending",
        Running = 2 => "running",
        Complete = 3 => "complete",
        Error = 4 => "error",
    }
}

define_status_enum! {
    /// Mission task (step) lifecycle status.
    TaskStatus {
        Pending = 1 => "pending",
        Running = 2 => "running",
        Complete = 3 => "complete",
        Error = 4 => "error",
    }
}

impl_run_lifecycle!(MissionStatus, TaskStatus);

/// Resolve a mission status ID to its name, `"unknown"` for unseeded IDs.
pub fn mission_status_name(id: StatusId) -> &'static str {
    MissionStatus::from_id(id).map_or("unknown", MissionStatus::name)
}

/// Resolve a task status ID to its name, `"unknown"` for unseeded IDs.
pub fn task_status_name(id: StatusId) -> &'static str {
    TaskStatus::from_id(id).map_or("unknown", TaskStatus::name)
}
