//! Type-token grammar shared by parsing and encoding.

use std::fmt;

use crate::SignatureError;

/// Primitive type markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
	Boolean,
	Byte,
	Char,
	Short,
	Int,
	Long,
	Float,
	Double,
	/// Only valid in result position.
	Void,
}

impl Primitive {
	const ALL: [Primitive; 9] = [
		Self::Boolean,
		Self::Byte,
		Self::Char,
		Self::Short,
		Self::Int,
		Self::Long,
		Self::Float,
		Self::Double,
		Self::Void,
	];

	/// Decodes a single-letter marker.
	pub const fn from_marker(marker: u8) -> Option<Self> {
		Some(match marker {
			b'Z' => Self::Boolean,
			b'B' => Self::Byte,
			b'C' => Self::Char,
			b'S' => Self::Short,
			b'I' => Self::Int,
			b'J' => Self::Long,
			b'F' => Self::Float,
			b'D' => Self::Double,
			b'V' => Self::Void,
			_ => return None,
		})
	}

	pub const fn marker(self) -> char {
		match self {
			Self::Boolean => 'Z',
			Self::Byte => 'B',
			Self::Char => 'C',
			Self::Short => 'S',
			Self::Int => 'I',
			Self::Long => 'J',
			Self::Float => 'F',
			Self::Double => 'D',
			Self::Void => 'V',
		}
	}

	/// Canonical human-readable name.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Boolean => "boolean",
			Self::Byte => "byte",
			Self::Char => "char",
			Self::Short => "short",
			Self::Int => "int",
			Self::Long => "long",
			Self::Float => "float",
			Self::Double => "double",
			Self::Void => "void",
		}
	}

	/// Looks a primitive up by its readable name.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.name() == name)
	}
}

/// One decoded type marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeToken {
	Primitive(Primitive),
	/// Fully-qualified, dot-separated type name.
	Object(String),
	Array(Box<TypeToken>),
}

impl TypeToken {
	/// Parses one token starting at `start`, returning it with the offset just past it.
	pub(crate) fn parse_at(descriptor: &str, start: usize) -> Result<(Self, usize), SignatureError> {
		let bytes = descriptor.as_bytes();
		let mut pos = start;
		let mut dims = 0usize;
		while bytes.get(pos) == Some(&b'[') {
			dims += 1;
			pos += 1;
		}

		let Some(&marker) = bytes.get(pos) else {
			return Err(SignatureError::malformed(descriptor, pos, "expected type marker"));
		};

		let (mut token, next) = match marker {
			b'L' => {
				let name_start = pos + 1;
				let Some(len) = descriptor[name_start..].find(';') else {
					return Err(SignatureError::malformed(descriptor, pos, "unterminated object type"));
				};
				let raw = &descriptor[name_start..name_start + len];
				if raw.is_empty() {
					return Err(SignatureError::malformed(descriptor, name_start, "empty object type name"));
				}
				if raw.contains(['(', ')', '[']) {
					return Err(SignatureError::malformed(descriptor, name_start, "invalid character in object type name"));
				}
				(Self::Object(raw.replace('/', ".")), name_start + len + 1)
			}
			other => match Primitive::from_marker(other) {
				Some(Primitive::Void) if dims > 0 => {
					return Err(SignatureError::malformed(descriptor, pos, "array of void"));
				}
				Some(p) => (Self::Primitive(p), pos + 1),
				None => return Err(SignatureError::malformed(descriptor, pos, "unknown type marker")),
			},
		};

		for _ in 0..dims {
			token = Self::Array(Box::new(token));
		}
		Ok((token, next))
	}

	/// Builds a token from a readable type name (`int[]`, `java.lang.String`).
	pub fn from_type_name(name: &str) -> Self {
		if let Some(element) = name.strip_suffix("[]") {
			return Self::Array(Box::new(Self::from_type_name(element)));
		}
		match Primitive::from_name(name) {
			Some(p) => Self::Primitive(p),
			None => Self::Object(name.to_string()),
		}
	}

	pub fn is_void(&self) -> bool {
		matches!(self, Self::Primitive(Primitive::Void))
	}

	/// Readable type name: `boolean`, `java.lang.String`, `int[][]`.
	pub fn type_name(&self) -> String {
		match self {
			Self::Primitive(p) => p.name().to_string(),
			Self::Object(name) => name.clone(),
			Self::Array(element) => format!("{}[]", element.type_name()),
		}
	}

	/// Appends the descriptor encoding to `out`.
	pub fn encode_into(&self, out: &mut String) {
		match self {
			Self::Primitive(p) => out.push(p.marker()),
			Self::Object(name) => {
				out.push('L');
				out.push_str(name);
				out.push(';');
			}
			Self::Array(element) => {
				out.push('[');
				element.encode_into(out);
			}
		}
	}
}

impl fmt::Display for TypeToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.type_name())
	}
}

/// Encodes a readable type name back into its descriptor marker.
pub fn encode_type_name(name: &str) -> String {
	let mut out = String::with_capacity(name.len() + 2);
	TypeToken::from_type_name(name).encode_into(&mut out);
	out
}
