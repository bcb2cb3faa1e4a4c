use anyhow::Context as _;

/// A value from PHP's `serialize()` format, as found in WordPress postmeta.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(Key, Value)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Array(entries) => entries.iter().find_map(|(k, v)| match k {
                Key::Str(s) if s == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn idx(&self, index: i64) -> Option<&Value> {
        match self {
            Value::Array(entries) => entries.iter().find_map(|(k, v)| match k {
                Key::Int(i) if *i == index => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

pub fn unserialize(input: &str) -> anyhow::Result<Value> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let value = parser.value()?;
    if parser.pos != parser.bytes.len() {
        anyhow::bail!(
            "trailing data after serialized value at byte {} of {}",
            parser.pos,
            parser.bytes.len()
        );
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn value(&mut self) -> anyhow::Result<Value> {
        match self.peek()? {
            b'N' => {
                self.expect(b"N;")?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b"b:")?;
                let flag = match self.take()? {
                    b'0' => false,
                    b'1' => true,
                    other => anyhow::bail!(
                        "expected '0' or '1' for bool, found {:?} at byte {}",
                        other as char,
                        self.pos - 1
                    ),
                };
                self.expect(b";")?;
                Ok(Value::Bool(flag))
            }
            b'i' => {
                self.expect(b"i:")?;
                let digits = self.until(b';')?;
                let n = digits
                    .parse::<i64>()
                    .with_context(|| format!("parse int {digits:?}"))?;
                Ok(Value::Int(n))
            }
            b'd' => {
                self.expect(b"d:")?;
                let digits = self.until(b';')?;
                let n = digits
                    .parse::<f64>()
                    .with_context(|| format!("parse float {digits:?}"))?;
                Ok(Value::Float(n))
            }
            b's' => Ok(Value::Str(self.string()?)),
            b'a' => {
                self.expect(b"a:")?;
                let count = self
                    .until(b':')?
                    .parse::<usize>()
                    .context("parse array length")?;
                self.expect(b"{")?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = match self.value()? {
                        Value::Int(i) => Key::Int(i),
                        Value::Str(s) => Key::Str(s),
                        other => anyhow::bail!("array key must be int or string, got {other:?}"),
                    };
                    entries.push((key, self.value()?));
                }
                self.expect(b"}")?;
                Ok(Value::Array(entries))
            }
            other => anyhow::bail!(
                "unsupported serialized type {:?} at byte {}",
                other as char,
                self.pos
            ),
        }
    }

    fn string(&mut self) -> anyhow::Result<String> {
        self.expect(b"s:")?;
        // The declared length counts bytes, not characters.
        let len = self
            .until(b':')?
            .parse::<usize>()
            .context("parse string length")?;
        self.expect(b"\"")?;
        let end = self.pos.checked_add(len).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            anyhow::bail!(
                "string of {len} bytes at byte {} runs past the end of input",
                self.pos
            );
        };
        let text = std::str::from_utf8(&self.bytes[self.pos..end])
            .with_context(|| format!("string at byte {} is not utf-8", self.pos))?
            .to_owned();
        self.pos = end;
        self.expect(b"\";")?;
        Ok(text)
    }

    fn peek(&self) -> anyhow::Result<u8> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unexpected end of serialized data"))
    }

    fn take(&mut self) -> anyhow::Result<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, literal: &[u8]) -> anyhow::Result<()> {
        if self.bytes[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            return Ok(());
        }
        anyhow::bail!(
            "expected {:?} at byte {}",
            String::from_utf8_lossy(literal),
            self.pos
        );
    }

    fn until(&mut self, delimiter: u8) -> anyhow::Result<&str> {
        let start = self.pos;
        while self.peek()? != delimiter {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .with_context(|| format!("bytes {start}..{} are not utf-8", self.pos))?;
        self.pos += 1;
        Ok(text)
    }
}
