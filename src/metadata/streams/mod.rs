//! Metadata streams (ECMA-335 II.24.2).
//!
//! The metadata root lists its streams by name. Four of them are heaps addressed by byte offset
//! (or 1-based index for `#GUID`), and one holds the tables:
//!
//! - **`#Strings`** - NUL-terminated UTF-8 identifiers. The first entry is the empty string.
//! - **`#US`** - string literals as compressed-length UTF-16LE records with a trailing flag byte.
//! - **`#Blob`** - compressed-length byte sequences such as signatures.
//! - **`#GUID`** - 16-byte GUID records.
//! - **`#~`** (or the uncompressed `#-`) - the metadata tables.
//!
//! Every heap type here is a borrowed view over the stream bytes and decodes entries on request.

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;
mod userstrings;

pub use blob::Blob;
pub use guid::Guid;
pub use streamheader::{StreamHeader, MAX_STREAM_NAME};
pub use strings::Strings;
pub use tablesheader::{TableLayout, TablesHeader, TABLES_HEADER_SIZE};
pub use userstrings::{user_string_flag, UserStringEntry, UserStrings, UserStringsIterator};
