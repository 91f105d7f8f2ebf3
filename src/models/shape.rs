//! `record_shape!`: declares a record type together with its field table
//!
//! ```rust,ignore
//! record_shape! {
//!     /// A product line
//!     pub struct Line {
//!         line_id: Integer = "line_id",
//!         title: Text = "title",
//!         added: Timestamp = "tm_added",
//!     }
//! }
//! ```
//!
//! Each field is `name: Kind = "source_key"` where `Kind` is one of
//! `Text`, `Integer`, `Decimal`, `Timestamp`, `Flag`, `Raw`. The struct
//! serializes with the source keys. An optional
//! `nested Wrapper { child: Shape = "key", ... }` block adds a `nested`
//! field holding one `Vec<Shape>` per child collection.

#[macro_export]
#[doc(hidden)]
macro_rules! __shape_type {
    (Text) => { ::std::string::String };
    (Integer) => { i64 };
    (Decimal) => { f64 };
    (Timestamp) => { ::std::option::Option<$crate::temporal::Timestamp> };
    (Flag) => { bool };
    (Raw) => { ::serde_json::Value };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __shape_slot {
    ($name:ident, Text, $field:ident) => {
        $crate::decode::Slot::Text(|r: &mut $name, v| r.$field = v)
    };
    ($name:ident, Integer, $field:ident) => {
        $crate::decode::Slot::Integer(|r: &mut $name, v| r.$field = v)
    };
    ($name:ident, Decimal, $field:ident) => {
        $crate::decode::Slot::Decimal(|r: &mut $name, v| r.$field = v)
    };
    ($name:ident, Timestamp, $field:ident) => {
        $crate::decode::Slot::Timestamp(|r: &mut $name, v| {
            r.$field = ::std::option::Option::Some(v)
        })
    };
    ($name:ident, Flag, $field:ident) => {
        $crate::decode::Slot::Flag(|r: &mut $name, v| r.$field = v)
    };
    ($name:ident, Raw, $field:ident) => {
        $crate::decode::Slot::Raw(|r: &mut $name, v| r.$field = v)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __shape_struct {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $kind:ident = $key:tt ),*
        }
        { $($extra:tt)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(rename = $key)]
                pub $field: $crate::__shape_type!($kind),
            )*
            $($extra)*
        }

        impl $crate::decode::FieldTable for $name {
            const NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::decode::FieldSpec<Self>] {
                static FIELDS: &[$crate::decode::FieldSpec<$name>] = &[
                    $(
                        $crate::decode::FieldSpec {
                            key: $key,
                            slot: $crate::__shape_slot!($name, $kind, $field),
                        },
                    )*
                ];
                FIELDS
            }
        }
    };
}

/// Declare a record type and its decoding table
#[macro_export]
macro_rules! record_shape {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $kind:ident = $key:tt ),* $(,)?
        }
        nested $wrapper:ident {
            $( $child:ident : $child_ty:ty = $child_key:tt ),* $(,)?
        }
    ) => {
        $crate::__shape_struct! {
            $(#[$meta])*
            $name { $( $(#[$fmeta])* $field : $kind = $key ),* }
            {
                /// Child collections decoded from the `nested` wrapper
                #[serde(rename = "nested")]
                pub nested: $wrapper,
            }
        }

        #[doc = concat!("Child collections of [`", stringify!($name), "`]")]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize)]
        pub struct $wrapper {
            $(
                #[serde(rename = $child_key)]
                pub $child: ::std::vec::Vec<$child_ty>,
            )*
        }

        impl $crate::decode::RecordShape for $name {
            fn attach_nested(
                &mut self,
                nested: &::serde_json::Map<::std::string::String, ::serde_json::Value>,
                mapper: &$crate::decode::FieldMapper<'_>,
            ) {
                $(
                    self.nested.$child = mapper.decode_list($child_key, nested.get($child_key));
                )*
            }
        }
    };
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $kind:ident = $key:tt ),* $(,)?
        }
    ) => {
        $crate::__shape_struct! {
            $(#[$meta])*
            $name { $( $(#[$fmeta])* $field : $kind = $key ),* }
            {}
        }

        impl $crate::decode::RecordShape for $name {}
    };
}
