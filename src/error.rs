use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum RouteError {
    XmlParse(quick_xml::Error),
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    InvalidNumber {
        element: &'static str,
        field: &'static str,
        value: String,
    },
    InvalidInput(String),
    Serialize(String),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "Missing attribute '{attribute}' on <{element}>")
            }
            Self::InvalidNumber {
                element,
                field,
                value,
            } => write!(f, "Invalid number '{value}' for '{field}' on <{element}>"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::Serialize(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for RouteError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for RouteError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<RouteError> for JsValue {
    fn from(e: RouteError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
