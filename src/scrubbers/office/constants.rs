//! Partes del paquete y reglas de limpieza de las propiedades del documento.

use super::xml::FieldSpec;

pub(super) const CORE_PART: &str = "docProps/core.xml";
pub(super) const APP_PART: &str = "docProps/app.xml";
pub(super) const CUSTOM_PART: &str = "docProps/custom.xml";

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
const APP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

/// Valor final de un campo: `None` lo elimina del XML.
#[derive(Clone, Copy, Debug)]
pub(super) struct FieldRule {
    pub field: FieldSpec,
    pub value: Option<&'static str>,
}

const fn clear(prefix: &'static str, local_name: &'static str, namespace: &'static str) -> FieldRule {
    FieldRule {
        field: FieldSpec::new(Some(prefix), local_name, namespace),
        value: None,
    }
}

const fn app(local_name: &'static str, value: Option<&'static str>) -> FieldRule {
    FieldRule {
        field: FieldSpec::new(None, local_name, APP_NS),
        value,
    }
}

pub(super) const CORE_RULES: [FieldRule; 13] = [
    clear("dc", "creator", DC_NS),
    clear("cp", "lastModifiedBy", CP_NS),
    clear("dcterms", "created", DCTERMS_NS),
    clear("dcterms", "modified", DCTERMS_NS),
    clear("cp", "lastPrinted", CP_NS),
    clear("dc", "title", DC_NS),
    clear("dc", "subject", DC_NS),
    clear("dc", "description", DC_NS),
    clear("dc", "identifier", DC_NS),
    clear("cp", "keywords", CP_NS),
    clear("cp", "category", CP_NS),
    clear("cp", "contentStatus", CP_NS),
    FieldRule {
        field: FieldSpec::new(Some("cp"), "revision", CP_NS),
        value: Some("1"),
    },
];

pub(super) const APP_RULES: [FieldRule; 8] = [
    app("Application", None),
    app("AppVersion", None),
    app("Company", None),
    app("Manager", None),
    app("Template", None),
    app("TotalTime", Some("0")),
    app("Pages", Some("0")),
    app("Words", Some("0")),
];

pub(super) const CUSTOM_PROPERTIES_EMPTY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/custom-properties\" xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\"/>\n";
