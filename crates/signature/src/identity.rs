use std::fmt;
use std::str::FromStr;

use crate::SignatureError;
use crate::token::TypeToken;

/// Identity of one operation: owning type, operation name, parameter and result type names.
///
/// Equality is structural. Type names are in readable form (`int`, `java.lang.String`,
/// `byte[]`), never in marker form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationIdentity {
	pub owner: String,
	pub name: String,
	pub params: Vec<String>,
	pub result: String,
}

impl OperationIdentity {
	pub fn new(
		owner: impl Into<String>,
		name: impl Into<String>,
		params: impl IntoIterator<Item = impl Into<String>>,
		result: impl Into<String>,
	) -> Self {
		Self {
			owner: owner.into(),
			name: name.into(),
			params: params.into_iter().map(Into::into).collect(),
			result: result.into(),
		}
	}

	/// Parses a canonical descriptor: `owner/operation(params)result`.
	///
	/// The owner may use either `.` or `/` as package separator; the operation name is the
	/// segment after the last `/` preceding `(`. Trailing input is rejected.
	pub fn parse(descriptor: &str) -> Result<Self, SignatureError> {
		let Some(paren) = descriptor.find('(') else {
			return Err(SignatureError::malformed(descriptor, descriptor.len(), "missing parameter list"));
		};
		let Some(slash) = descriptor[..paren].rfind('/') else {
			return Err(SignatureError::malformed(descriptor, 0, "missing owner separator"));
		};

		let owner = &descriptor[..slash];
		if owner.is_empty() {
			return Err(SignatureError::malformed(descriptor, 0, "empty owner type"));
		}
		let name = &descriptor[slash + 1..paren];
		if name.is_empty() {
			return Err(SignatureError::malformed(descriptor, slash + 1, "empty operation name"));
		}

		let bytes = descriptor.as_bytes();
		let mut params = Vec::new();
		let mut pos = paren + 1;
		loop {
			match bytes.get(pos) {
				None => return Err(SignatureError::malformed(descriptor, pos, "unterminated parameter list")),
				Some(b')') => {
					pos += 1;
					break;
				}
				Some(_) => {
					let (token, next) = TypeToken::parse_at(descriptor, pos)?;
					if token.is_void() {
						return Err(SignatureError::malformed(descriptor, pos, "void parameter"));
					}
					params.push(token.type_name());
					pos = next;
				}
			}
		}

		let (result, end) = TypeToken::parse_at(descriptor, pos)?;
		if end != descriptor.len() {
			return Err(SignatureError::malformed(descriptor, end, "trailing characters"));
		}

		Ok(Self {
			owner: owner.replace('/', "."),
			name: name.to_string(),
			params,
			result: result.type_name(),
		})
	}

	/// Produces the canonical descriptor string; `parse(encode(id)) == id`.
	pub fn encode(&self) -> String {
		let mut out = String::with_capacity(self.owner.len() + self.name.len() + 16);
		out.push_str(&self.owner);
		out.push('/');
		out.push_str(&self.name);
		out.push('(');
		for param in &self.params {
			TypeToken::from_type_name(param).encode_into(&mut out);
		}
		out.push(')');
		TypeToken::from_type_name(&self.result).encode_into(&mut out);
		out
	}

	/// Short description for tracing.
	pub fn describe(&self) -> String {
		format!("{self} -> {}", self.result)
	}
}

impl fmt::Display for OperationIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}({})", self.owner, self.name, self.params.join(", "))
	}
}

impl FromStr for OperationIdentity {
	type Err = SignatureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
