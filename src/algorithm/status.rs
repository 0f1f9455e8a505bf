//! Node statuses and handler actions.

use crate::message::MetaHeader;

/// A closed set of statuses defined by one algorithm.
///
/// Nodes store the status as its name so several algorithms can run one
/// after another on the same network. Use [`status_values!`] to declare
/// an enum together with this impl.
///
/// [`status_values!`]: crate::status_values
pub trait StatusValue: Copy + Eq + Ord + std::fmt::Debug + 'static {
    /// Every status, in declaration order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.name() == name)
    }
}

/// Declare a status enum and its [`StatusValue`] impl.
///
/// ```rust
/// distsim::status_values! {
///     pub enum Phase {
///         Idle => "IDLE",
///         Done => "DONE",
///     }
/// }
/// use distsim::algorithm::StatusValue;
/// assert_eq!(Phase::from_name("DONE"), Some(Phase::Done));
/// ```
#[macro_export]
macro_rules! status_values {
    ($vis:vis enum $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::algorithm::StatusValue for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::algorithm::StatusValue::name(*self))
            }
        }
    };
}

/// What triggered a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Spontaneously,
    Receiving,
    Alarm,
    /// Fallback used when a status has no handler for the specific action.
    Default,
}

impl Action {
    /// The action a message of this kind triggers.
    pub fn for_message(meta_header: MetaHeader) -> Self {
        match meta_header {
            MetaHeader::Initialization => Action::Spontaneously,
            MetaHeader::Normal => Action::Receiving,
            MetaHeader::Alarm => Action::Alarm,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Spontaneously => write!(f, "spontaneously"),
            Action::Receiving => write!(f, "receiving"),
            Action::Alarm => write!(f, "alarm"),
            Action::Default => write!(f, "default"),
        }
    }
}
