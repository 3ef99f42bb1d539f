//! Include resolution

use tracing::debug;
use yolol_vm_parser::ast::nolol::{Element, IncludeDirective};
use yolol_vm_parser::{parse_nolol_file, walk, NodeMut, Visit, Visitor};

use super::{Context, Included, Parsed, MAX_NESTING};
use crate::error::{ConvertError, IncludeError};
use crate::include::{include_file_name, FileSystem};

/// Replace every include directive with the elements of the included file.
/// Included files may include further files.
pub(crate) fn resolve(ctx: &mut Context<'_>, Parsed(mut program): Parsed) -> Result<Included, ConvertError> {
    let mut resolver = IncludeResolver {
        fs: ctx.fs,
        extension: &ctx.options.include_extension,
        count: 0,
    };
    walk(&mut program, &mut resolver)?;
    debug!(
        includes = resolver.count,
        elements = program.elements.len(),
        "includes resolved"
    );
    Ok(Included(program))
}

struct IncludeResolver<'a> {
    fs: &'a dyn FileSystem,
    extension: &'a str,
    count: usize,
}

impl IncludeResolver<'_> {
    fn load(&mut self, include: &IncludeDirective) -> Result<Vec<Element>, ConvertError> {
        self.count += 1;
        if self.count > MAX_NESTING {
            return Err(ConvertError::IncludeLoop {
                span: include.span.clone(),
            });
        }
        let file = include_file_name(&include.file, self.extension);
        let source = self.fs.get(&file).map_err(|e| match e {
            IncludeError::FileNotFound { .. } => ConvertError::FileNotFound {
                file: file.clone(),
                span: include.span.clone(),
            },
            IncludeError::IoError { message, .. } => ConvertError::IncludeFailed {
                file: file.clone(),
                message,
                span: include.span.clone(),
            },
        })?;
        let program = parse_nolol_file(&source, Some(&file)).map_err(|errors| ConvertError::Parse {
            file: file.clone(),
            errors,
        })?;
        debug!(file = %file, elements = program.elements.len(), "file included");
        Ok(program.elements)
    }
}

impl Visitor for IncludeResolver<'_> {
    type Error = ConvertError;

    fn visit(&mut self, node: NodeMut<'_>, _phase: yolol_vm_parser::Phase) -> Result<Visit, ConvertError> {
        let NodeMut::Element(Element::Include(include)) = node else {
            return Ok(Visit::Continue);
        };
        // Revisited, so nested includes resolve too
        Ok(Visit::replace(self.load(include)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::include::MemoryFileSystem;
    use yolol_vm_parser::parse_nolol;

    fn resolve_with(fs: &MemoryFileSystem, source: &str) -> Result<Included, ConvertError> {
        let options = ConvertOptions::default();
        let mut ctx = Context::new(&options, fs);
        resolve(&mut ctx, Parsed(parse_nolol(source).unwrap()))
    }

    #[test]
    fn test_nested_includes() {
        let mut fs = MemoryFileSystem::new();
        fs.register("outer.nolol", "a = 1\ninclude \"inner\"");
        fs.register("inner.nolol", "b = 2");
        let Included(program) = resolve_with(&fs, "include \"outer\"\nc = 3").unwrap();
        assert_eq!(program.elements.len(), 3);
        assert!(program
            .elements
            .iter()
            .all(|e| matches!(e, Element::Line(_))));
        // spans point into the file they came from
        assert_eq!(
            program.elements[1].span().file.as_deref(),
            Some("inner.nolol")
        );
    }

    #[test]
    fn test_include_loop() {
        let mut fs = MemoryFileSystem::new();
        fs.register("a.nolol", "include \"b\"");
        fs.register("b.nolol", "include \"a\"");
        let err = resolve_with(&fs, "include \"a\"").err().unwrap();
        assert!(matches!(err, ConvertError::IncludeLoop { .. }));
    }

    #[test]
    fn test_missing_file() {
        let fs = MemoryFileSystem::new();
        let err = resolve_with(&fs, "include \"nowhere\"").err().unwrap();
        assert!(
            matches!(err, ConvertError::FileNotFound { ref file, .. } if file == "nowhere.nolol")
        );
    }

    #[test]
    fn test_parse_error_in_included_file() {
        let mut fs = MemoryFileSystem::new();
        fs.register("bad.nolol", "a = = 1");
        let err = resolve_with(&fs, "include \"bad\"").err().unwrap();
        assert!(matches!(err, ConvertError::Parse { ref file, .. } if file == "bad.nolol"));
    }
}
