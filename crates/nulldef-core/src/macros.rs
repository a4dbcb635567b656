//! # Descriptor Generation
//!
//! [`defend!`](crate::defend) writes the [`Defend`](crate::Defend) and
//! [`Entry`](crate::Entry) impls for plain structs from a field table.

/// Generate field descriptors for one or more structs.
///
/// Each field names its [`Slot`](crate::Slot) constructor (`primitive`,
/// `value`, `object`, `embedded`, `collection`, `nullable_collection`, `map`,
/// `nullable_map`) and
/// optionally a tag list. A tag list after the type name tags the type
/// itself. Fields are inspected in the order written here.
///
/// ```
/// use nulldef_core::defend;
///
/// struct Language {
///     known_languages: Vec<Option<String>>,
/// }
///
/// struct Child {
///     name: Option<String>,
///     age: u32,
///     language: Option<Language>,
/// }
///
/// struct Address {
///     street: Option<String>,
///     floor: u8,
/// }
///
/// defend! {
///     Language {
///         known_languages [mandatory]: collection,
///     }
///     Child {
///         name [mandatory]: value,
///         age [mandatory]: primitive,
///         language [mandatory]: object,
///     }
///     Address [mandatory] {
///         street: value,
///         floor: primitive,
///     }
/// }
/// ```
#[macro_export]
macro_rules! defend {
    ($(
        $ty:ident $([ $($type_tag:ident),* $(,)? ])? {
            $( $field:ident $([ $($tag:ident),* $(,)? ])? : $kind:ident ),* $(,)?
        }
    )+) => {
        $(
            impl $crate::Defend for $ty {
                fn type_name(&self) -> &str {
                    stringify!($ty)
                }

                fn type_tags(&self) -> $crate::Tags<'_> {
                    $crate::Tags::Static(&[$($(stringify!($type_tag)),*)?])
                }

                fn fields(&mut self) -> ::std::vec::Vec<$crate::Field<'_>> {
                    ::std::vec![$(
                        $crate::Field::new(
                            stringify!($field),
                            $crate::Tags::Static(&[$($(stringify!($tag)),*)?]),
                            $crate::Slot::$kind(&mut self.$field),
                        )
                    ),*]
                }
            }

            impl $crate::Entry for $ty {
                fn defend_entry(&mut self, policy: &$crate::FilterPolicy) -> bool {
                    $crate::filter::defend_nested(self, policy)
                }
            }
        )+
    };
}
