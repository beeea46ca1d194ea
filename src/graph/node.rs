#![forbid(unsafe_code)]

use std::fmt;

use crate::graph::spec::AstJson;
use crate::graph::vertex::Vertex;
use crate::types::VertexId;

const SNIPPET_LIMIT: usize = 50;

/// Metadata of a code-line vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeProperty {
    /// 1-based line number; 0 when the store did not provide one.
    pub lineno: u32,
    /// Source text of the line.
    pub code: String,
    /// File the line belongs to.
    pub file: String,
    /// Parsed AST of the line.
    pub json: AstJson,
    /// Name of the enclosing function, if any.
    pub function_def_name: Option<String>,
}

/// Metadata of a file vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct FileProperty {
    /// Path of the file.
    pub path: String,
}

/// A code-line vertex with its decoded properties.
#[derive(Clone, Debug)]
pub struct CodeNode {
    /// Source vertex.
    pub vertex: Vertex,
    /// Decoded properties.
    pub property: CodeProperty,
}

/// A file vertex with its decoded properties.
#[derive(Clone, Debug)]
pub struct FileNode {
    /// Source vertex.
    pub vertex: Vertex,
    /// Decoded properties.
    pub property: FileProperty,
}

/// Graph-node view of a registered vertex.
#[derive(Clone, Debug)]
pub enum GraphNode {
    /// One line of code.
    Code(CodeNode),
    /// One source file.
    File(FileNode),
}

impl GraphNode {
    /// Vertex id.
    pub fn id(&self) -> VertexId {
        self.vertex().id
    }

    /// Underlying vertex.
    pub fn vertex(&self) -> &Vertex {
        match self {
            GraphNode::Code(node) => &node.vertex,
            GraphNode::File(node) => &node.vertex,
        }
    }

    /// Code-line metadata, if this is a code node.
    pub fn as_code(&self) -> Option<&CodeProperty> {
        match self {
            GraphNode::Code(node) => Some(&node.property),
            GraphNode::File(_) => None,
        }
    }

    /// File path for file nodes, owning file for code nodes.
    pub fn file(&self) -> &str {
        match self {
            GraphNode::Code(node) => &node.property.file,
            GraphNode::File(node) => &node.property.path,
        }
    }

    /// Short location label: the line number for code, the path for files.
    pub fn location(&self) -> String {
        match self {
            GraphNode::Code(node) => node.property.lineno.to_string(),
            GraphNode::File(node) => node.property.path.clone(),
        }
    }
}

impl fmt::Display for GraphNode {
    /// `(file:line) code`, with code cut to a short snippet.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphNode::Code(node) => {
                let prop = &node.property;
                write!(f, "({}:{}) ", prop.file, prop.lineno)?;
                let code = prop.code.trim();
                if code.chars().count() > SNIPPET_LIMIT {
                    let cut: String = code.chars().take(SNIPPET_LIMIT).collect();
                    write!(f, "{cut}...")
                } else {
                    f.write_str(code)
                }
            }
            GraphNode::File(node) => write!(f, "({})", node.property.path),
        }
    }
}
