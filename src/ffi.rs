//! C-ABI FFI bindings for cross-language integration.
//!
//! Every extraction entry point returns fragments as a JSON array, the same
//! records `sempdf extract` prints.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr;

use crate::reader::{self, DocumentReader};
use crate::render::{self, JsonFormat};
use crate::{ExtractOptions, ExtractorRegistry, FragmentKind, TextMode};

/// Result structure returned by FFI functions.
#[repr(C)]
pub struct SempdfResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// The result data (null if failed). Must be freed with `sempdf_free_result`.
    pub data: *mut c_char,
    /// Error message (null if succeeded). Must be freed with `sempdf_free_result`.
    pub error: *mut c_char,
}

impl SempdfResult {
    fn success(data: String) -> Self {
        Self {
            success: true,
            data: CString::new(data).unwrap_or_default().into_raw(),
            error: ptr::null_mut(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: ptr::null_mut(),
            error: CString::new(message).unwrap_or_default().into_raw(),
        }
    }
}

impl From<crate::Result<String>> for SempdfResult {
    fn from(result: crate::Result<String>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

/// Options for extraction via FFI.
#[repr(C)]
pub struct SempdfOptions {
    /// Skip unreadable pages instead of failing.
    pub lenient: bool,
    /// Process pages on the calling thread only.
    pub sequential: bool,
    /// Emit one text fragment per sentence line instead of per block.
    pub sentences: bool,
    /// Pretty-print the JSON output.
    pub pretty: bool,
}

impl Default for SempdfOptions {
    fn default() -> Self {
        Self {
            lenient: true,
            sequential: false,
            sentences: false,
            pretty: false,
        }
    }
}

impl SempdfOptions {
    fn extract_options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new().with_parallel(!self.sequential);
        if self.lenient {
            options = options.lenient();
        }
        if self.sentences {
            options = options.with_text_mode(TextMode::Sentences);
        }
        options
    }

    fn json_format(&self) -> JsonFormat {
        if self.pretty {
            JsonFormat::Pretty
        } else {
            JsonFormat::Compact
        }
    }
}

/// Borrow a C string argument as UTF-8.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} cannot be null", name));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 {}", name))
}

/// Extract fragments of one kind as JSON.
///
/// `kind` is one of `text`, `formula`, `image` or `table`.
///
/// # Safety
///
/// `path` and `kind` must be valid null-terminated UTF-8 strings.
/// The returned result must be freed with `sempdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn sempdf_extract(
    path: *const c_char,
    kind: *const c_char,
    options: SempdfOptions,
) -> SempdfResult {
    let path = match str_arg(path, "path") {
        Ok(s) => s,
        Err(e) => return SempdfResult::error(e),
    };
    let kind = match str_arg(kind, "kind") {
        Ok(s) => s,
        Err(e) => return SempdfResult::error(e),
    };

    extract_internal(Path::new(path), kind, &options).into()
}

fn extract_internal(path: &Path, kind: &str, options: &SempdfOptions) -> crate::Result<String> {
    let kind: FragmentKind = kind.parse()?;
    let registry = ExtractorRegistry::with_options(options.extract_options());
    let fragments = registry.extract(path, kind)?;
    render::to_json(&fragments, options.json_format())
}

/// Extract every kind of fragment as one JSON array.
///
/// # Safety
///
/// `path` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `sempdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn sempdf_extract_all(
    path: *const c_char,
    options: SempdfOptions,
) -> SempdfResult {
    let path = match str_arg(path, "path") {
        Ok(s) => s,
        Err(e) => return SempdfResult::error(e),
    };

    extract_all_internal(Path::new(path), &options).into()
}

fn extract_all_internal(path: &Path, options: &SempdfOptions) -> crate::Result<String> {
    let registry = ExtractorRegistry::with_options(options.extract_options());
    let fragments = registry.extract_all(path)?;
    render::to_json(&fragments, options.json_format())
}

/// Get document information as JSON.
///
/// # Safety
///
/// `path` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `sempdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn sempdf_get_info(path: *const c_char) -> SempdfResult {
    let path = match str_arg(path, "path") {
        Ok(s) => s,
        Err(e) => return SempdfResult::error(e),
    };

    get_info_internal(Path::new(path)).into()
}

fn get_info_internal(path: &Path) -> crate::Result<String> {
    let info = reader::open(path, &ExtractOptions::default())?.info();
    serde_json::to_string_pretty(&info)
        .map_err(|e| crate::Error::Render(format!("JSON serialization error: {}", e)))
}

/// Get the page count of a PDF file.
///
/// # Safety
///
/// `path` must be a valid null-terminated UTF-8 string.
/// Returns -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sempdf_get_page_count(path: *const c_char) -> i32 {
    let Ok(path) = str_arg(path, "path") else {
        return -1;
    };

    match reader::open(path, &ExtractOptions::default()) {
        Ok(backend) => backend.page_count() as i32,
        Err(_) => -1,
    }
}

/// Check if a file starts with a supported PDF header.
///
/// # Safety
///
/// `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn sempdf_is_pdf(path: *const c_char) -> bool {
    match str_arg(path, "path") {
        Ok(path) => reader::header::sniff_path(path).is_ok(),
        Err(_) => false,
    }
}

/// Free a result returned by any sempdf function.
///
/// # Safety
///
/// The `result` must have been returned by a sempdf function.
/// This function should only be called once per result.
#[no_mangle]
pub unsafe extern "C" fn sempdf_free_result(result: SempdfResult) {
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
    if !result.error.is_null() {
        drop(CString::from_raw(result.error));
    }
}

/// Get the version of the sempdf library.
///
/// The returned string is statically allocated and should not be freed.
#[no_mangle]
pub extern "C" fn sempdf_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
