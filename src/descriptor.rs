//! Describes the splice operation to a host that orchestrates image
//! manipulations. None of these values change how a splice runs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// The donor image, supplied by the host.
    Donor,
    YesNo { default: bool },
    List {
        values: &'static [&'static str],
        default: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument {
    pub name: &'static str,
    pub kind: ArgumentKind,
    pub description: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub category: &'static str,
    pub software: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub transitions: &'static [&'static str],
    pub arguments: &'static [Argument],
}

/// Tags reported to the host for every image the operation produces.
pub const RESULT_TAGS: [(&str, &str); 2] = [("subject", "face"), ("purpose", "add")];

pub const PURPOSES: &[&str] = &["remove", "add", "blend"];

pub const SUBJECTS: &[&str] = &[
    "people",
    "face",
    "natural object",
    "man-made object",
    "large man-made object",
    "landscape",
    "other",
];

pub const PASTE_SPLICE: OperationDescriptor = OperationDescriptor {
    name: "PasteSplice",
    category: "Paste",
    software: "GAN_face_splice",
    version: env!("CARGO_PKG_VERSION"),
    description: "Swap the faces of two photographs",
    transitions: &["image.image"],
    arguments: &[
        Argument {
            name: "donor",
            kind: ArgumentKind::Donor,
            description: Some("The donor image from which to select the face"),
        },
        Argument {
            name: "donor rotated",
            kind: ArgumentKind::YesNo { default: true },
            description: Some("Enter yes if the donor is rotated during the paste operation"),
        },
        Argument {
            name: "donor cropped",
            kind: ArgumentKind::YesNo { default: false },
            description: Some(
                "Enter yes if the donor is cropped during the paste operation. \
                 Ideally, crop should occur as a SelectRegion operation just prior to donation",
            ),
        },
        Argument {
            name: "donor resized",
            kind: ArgumentKind::YesNo { default: true },
            description: Some("Enter yes if the donor is resized during the paste operation"),
        },
        Argument {
            name: "purpose",
            kind: ArgumentKind::List {
                values: PURPOSES,
                default: "add",
            },
            description: Some("Purpose: remove an object, add an object."),
        },
        Argument {
            name: "subject",
            kind: ArgumentKind::List {
                values: SUBJECTS,
                default: "face",
            },
            description: None,
        },
    ],
};

impl OperationDescriptor {
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKind::Donor => write!(f, "donor"),
            ArgumentKind::YesNo { default } => {
                write!(f, "yesno (default {})", if *default { "yes" } else { "no" })
            }
            ArgumentKind::List { values, default } => {
                write!(f, "list [{}] (default {default})", values.join(", "))
            }
        }
    }
}

impl fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} ({})", self.software, self.version, self.category)?;
        writeln!(f, "  name: {}", self.name)?;
        writeln!(f, "  description: {}", self.description)?;
        writeln!(f, "  transitions: {}", self.transitions.join(", "))?;
        writeln!(f, "  arguments:")?;
        for arg in self.arguments {
            write!(f, "    {}: {}", arg.name, arg.kind)?;
            match arg.description {
                Some(d) => writeln!(f, " - {d}")?,
                None => writeln!(f)?,
            }
        }
        let tags: Vec<String> = RESULT_TAGS.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "  result tags: {}", tags.join(", "))
    }
}
