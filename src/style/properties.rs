//! Property tables: the snapshot allowlist, inheritance, initial values and
//! shorthand/longhand relationships.

/// Properties copied from resolved style onto the working tree, in the order
/// they are written. Anything not listed here (transforms, flex layout, ...)
/// does not survive a copy.
pub const SNAPSHOT_PROPERTIES: &[&str] = &[
    "background",
    "background-color",
    "border",
    "border-color",
    "border-width",
    "border-style",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
    "border-top-style",
    "border-right-style",
    "border-bottom-style",
    "border-left-style",
    "border-radius",
    "box-shadow",
    "padding",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "margin",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "text-align",
    "text-decoration",
    "white-space",
    "list-style",
    "list-style-position",
    "list-style-type",
    "display",
    "background-image",
    "background-clip",
    "background-position",
    "background-repeat",
    "background-size",
];

const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-position",
    "list-style-type",
    "text-align",
    "text-indent",
    "white-space",
    "word-break",
];

/// Custom properties and the usual text properties inherit.
pub fn is_inherited(name: &str) -> bool {
    is_custom_property(name) || INHERITED.contains(&name)
}

pub fn is_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

/// Initial value used when nothing in the cascade sets a property that every
/// element resolves (inherited properties at the root, and `display`).
pub fn initial_value(name: &str) -> Option<&'static str> {
    let value = match name {
        "color" => "rgb(0, 0, 0)",
        "font-size" => "16px",
        "font-weight" => "400",
        "font-style" => "normal",
        "line-height" => "normal",
        "text-align" => "start",
        "white-space" => "normal",
        "list-style-position" => "outside",
        "list-style-type" => "disc",
        "display" => "inline",
        "border-top-width" | "border-right-width" | "border-bottom-width"
        | "border-left-width" => "medium",
        "border-top-style" | "border-right-style" | "border-bottom-style"
        | "border-left-style" => "none",
        "border-top-color" | "border-right-color" | "border-bottom-color"
        | "border-left-color" => "currentcolor",
        "background-color" => "transparent",
        "background-image" => "none",
        _ => return None,
    };
    Some(value)
}

/// Properties that always resolve, even on elements nothing targets.
pub const ALWAYS_RESOLVED: &[&str] = &["display"];

// ─────────────────────────────────────────────────────────────────────────────
// Shorthands
// ─────────────────────────────────────────────────────────────────────────────

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Longhands a shorthand sets. Empty for longhands and unknown names.
pub fn longhands(name: &str) -> &'static [&'static str] {
    match name {
        "margin" => &["margin-top", "margin-right", "margin-bottom", "margin-left"],
        "padding" => &["padding-top", "padding-right", "padding-bottom", "padding-left"],
        "border-width" => &[
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
        ],
        "border-style" => &[
            "border-top-style",
            "border-right-style",
            "border-bottom-style",
            "border-left-style",
        ],
        "border-color" => &[
            "border-top-color",
            "border-right-color",
            "border-bottom-color",
            "border-left-color",
        ],
        "border-top" => &["border-top-width", "border-top-style", "border-top-color"],
        "border-right" => &["border-right-width", "border-right-style", "border-right-color"],
        "border-bottom" => &[
            "border-bottom-width",
            "border-bottom-style",
            "border-bottom-color",
        ],
        "border-left" => &["border-left-width", "border-left-style", "border-left-color"],
        "border" => &[
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
            "border-top-style",
            "border-right-style",
            "border-bottom-style",
            "border-left-style",
            "border-top-color",
            "border-right-color",
            "border-bottom-color",
            "border-left-color",
        ],
        "background" => &[
            "background-color",
            "background-image",
            "background-clip",
            "background-position",
            "background-repeat",
            "background-size",
        ],
        "list-style" => &["list-style-type", "list-style-position"],
        _ => &[],
    }
}

/// Shorthands (including intermediate ones like `border-left`) that set
/// `longhand`.
pub fn shorthands_of(longhand: &str) -> impl Iterator<Item = &'static str> + '_ {
    const SHORTHANDS: &[&str] = &[
        "margin",
        "padding",
        "border-width",
        "border-style",
        "border-color",
        "border-top",
        "border-right",
        "border-bottom",
        "border-left",
        "border",
        "background",
        "list-style",
    ];
    SHORTHANDS
        .iter()
        .copied()
        .filter(move |s| longhands(s).contains(&longhand))
}

/// True if declaring `shorthand` also sets `property`.
pub fn covers(shorthand: &str, property: &str) -> bool {
    longhands(shorthand).contains(&property)
}

/// Longhand name for one side of a box shorthand (`margin` -> `margin-top`,
/// `border-width` -> `border-top-width`).
pub fn side_longhand(shorthand: &str, side: usize) -> Option<&'static str> {
    let side = *SIDES.get(side)?;
    longhands(shorthand)
        .iter()
        .copied()
        .find(|l| l.contains(side))
}
