// ── Response decoding ──
//
// Single entry point for every response body. The document is first
// read into a small element tree with quick-xml, then interpreted as a
// `methodResponse`. Substring sniffing is never used to judge success.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::value::{Member, Value};

/// Result of interpreting one response body.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// `methodResponse/params/param/value`. An empty `<params>` yields `Nil`.
    Ok(Value),
    /// `methodResponse/fault` with its code and string.
    Fault { code: i64, message: String },
    /// Not a `methodResponse` we can understand.
    Malformed { reason: String },
}

/// Decode a raw response body.
pub fn decode_response(body: &str) -> RpcOutcome {
    let root = match parse_tree(body) {
        Ok(root) => root,
        Err(reason) => return RpcOutcome::Malformed { reason },
    };

    if root.name != "methodResponse" {
        return RpcOutcome::Malformed {
            reason: format!("expected <methodResponse>, found <{}>", root.name),
        };
    }

    if let Some(fault) = root.child("fault") {
        return decode_fault(fault);
    }

    let Some(params) = root.child("params") else {
        return RpcOutcome::Malformed {
            reason: "response has neither <params> nor <fault>".into(),
        };
    };

    let Some(param) = params.child("param") else {
        return RpcOutcome::Ok(Value::Nil);
    };

    match param.child("value").map(decode_value) {
        Some(Ok(value)) => RpcOutcome::Ok(value),
        Some(Err(reason)) => RpcOutcome::Malformed { reason },
        None => RpcOutcome::Malformed {
            reason: "<param> without <value>".into(),
        },
    }
}

fn decode_fault(fault: &Element) -> RpcOutcome {
    let value = match fault.child("value").map(decode_value) {
        Some(Ok(value)) => value,
        Some(Err(reason)) => return RpcOutcome::Malformed { reason },
        None => {
            return RpcOutcome::Fault {
                code: 0,
                message: String::new(),
            };
        }
    };

    let code = match value.member("faultCode") {
        Some(Value::Int(code)) => *code,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    let message = value
        .member("faultString")
        .and_then(Value::scalar_text)
        .unwrap_or_default();

    RpcOutcome::Fault { code, message }
}

fn decode_value(el: &Element) -> Result<Value, String> {
    let Some(typed) = el.children.first() else {
        // Untyped <value>text</value> is a string per XML-RPC.
        return Ok(Value::String(el.text.clone()));
    };

    match typed.name.as_str() {
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(typed.text.clone())),
        "int" | "i4" | "i8" => typed
            .text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|e| format!("invalid <{}> '{}': {e}", typed.name, typed.text)),
        "boolean" => match typed.text.trim() {
            "1" | "true" => Ok(Value::Boolean(true)),
            "0" | "false" => Ok(Value::Boolean(false)),
            other => Err(format!("invalid <boolean> '{other}'")),
        },
        "double" => typed
            .text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|e| format!("invalid <double> '{}': {e}", typed.text)),
        "nil" => Ok(Value::Nil),
        "array" => {
            let Some(data) = typed.child("data") else {
                return Ok(Value::Array(Vec::new()));
            };
            data.children_named("value")
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "struct" => typed
            .children_named("member")
            .map(decode_member)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Struct),
        other => Err(format!("unsupported value type <{other}>")),
    }
}

fn decode_member(el: &Element) -> Result<Member, String> {
    let name = el
        .child("name")
        .map(|n| n.text.clone())
        .ok_or_else(|| "<member> without <name>".to_string())?;
    let value = match el.child("value") {
        Some(v) => decode_value(v)?,
        None => Value::Nil,
    };
    Ok(Member { name, value })
}

// ── Element tree ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_tree(body: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(Element::named(local_name(e.name().as_ref())));
            }
            Ok(Event::Empty(ref e)) => {
                let el = Element::named(local_name(e.name().as_ref()));
                attach(&mut stack, &mut root, el)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("bad text at {}: {err}", reader.buffer_position()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name().as_ref());
                let el = stack
                    .pop()
                    .ok_or_else(|| format!("unexpected </{name}>"))?;
                if el.name != name {
                    return Err(format!("mismatched </{name}>, expected </{}>", el.name));
                }
                attach(&mut stack, &mut root, el)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }
    root.ok_or_else(|| "empty document".to_string())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        Ok(())
    } else if root.is_none() {
        *root = Some(el);
        Ok(())
    } else {
        Err(format!("second root element <{}>", el.name))
    }
}

/// Strip any namespace prefix from a tag name.
fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rfind(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.to_string(),
    }
}
