/// Declares `PackageStatus` together with its prefix table and one
/// `is_<status>()` predicate per variant on both the status and `PackageRef`.
///
/// The `none` line names the unprefixed state, which is declared last.
macro_rules! package_statuses {
    (
        $(#[$none_meta:meta])*
        none => $none:ident, $none_predicate:ident;
        $(
            $(#[$meta:meta])*
            $prefix:literal => $variant:ident, $predicate:ident;
        )+
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum PackageStatus {
            $(
                $(#[$meta])*
                $variant,
            )+
            $(#[$none_meta])*
            $none,
        }

        /// Prefix character of every status that has one.
        pub const STATUS_PREFIXES: &[(char, PackageStatus)] = &[
            $(($prefix, PackageStatus::$variant),)+
        ];

        impl PackageStatus {
            /// Looks up the status marked by `c`, if `c` is a status prefix.
            pub fn from_prefix(c: char) -> Option<PackageStatus> {
                match c {
                    $($prefix => Some(PackageStatus::$variant),)+
                    _ => None,
                }
            }

            /// The prefix character, `None` for the unprefixed state.
            pub fn prefix(self) -> Option<char> {
                match self {
                    $(PackageStatus::$variant => Some($prefix),)+
                    PackageStatus::$none => None,
                }
            }

            $(
                pub fn $predicate(self) -> bool {
                    self == PackageStatus::$variant
                }
            )+

            pub fn $none_predicate(self) -> bool {
                self == PackageStatus::$none
            }
        }

        impl PackageRef {
            $(
                pub fn $predicate(&self) -> bool {
                    self.status.$predicate()
                }
            )+

            pub fn $none_predicate(&self) -> bool {
                self.status.$none_predicate()
            }
        }
    };
}
