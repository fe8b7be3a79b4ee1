//! Crate-wide constants
//!
//! Single source of truth for node names, tags and file-format framing used
//! throughout the serializer.

/// Settings file location defaults
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "statefile";

    /// Settings document file name
    pub const FILENAME: &str = "settings.xml";
}

/// Persisted document framing and node names
pub mod format {
    /// UTF-8 byte-order mark written before the header
    pub const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

    /// Header line written before the document body
    pub const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

    /// Root node of every settings document
    pub const ROOT_NODE: &str = "settings";

    /// One persisted named value
    pub const RECORD_NODE: &str = "record";

    /// Element of an array or entry of a map
    pub const ITEM_NODE: &str = "item";

    /// Key sub-node of a map item
    pub const KEY_NODE: &str = "key";

    /// Value sub-node of a map item
    pub const VALUE_NODE: &str = "value";

    /// Attribute carrying a record's name
    pub const NAME_ATTR: &str = "name";

    /// Attribute carrying a record's provenance
    pub const SOURCE_ATTR: &str = "source";

    /// Attribute carrying a value's type or shape tag
    pub const TYPE_ATTR: &str = "type";

    /// Shape tag for ordered sequences (arrays, lists, sets)
    pub const ARRAY_TAG: &str = "array";

    /// Shape tag for order-preserving maps
    pub const MAP_TAG: &str = "map";

    /// Type-attribute spelling for an explicit null
    pub const NULL_TAG: &str = "null";
}
