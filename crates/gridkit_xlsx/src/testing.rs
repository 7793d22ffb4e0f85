//! Shared record and model fixtures for unit tests.

use crate::error::{GridError, Result};
use crate::model::{EnumFieldValue, SheetModel, SheetRecord};
use crate::spec::{EnumHeaderField, SpecFieldDescriptor, SpecMeasurement};

/// Three plain 1x1 columns `a`, `b`, `c`.
#[derive(Debug, Clone)]
pub struct Plain3 {
    pub id: usize,
}

impl Plain3 {
    pub fn new(id: usize) -> Self {
        Self { id }
    }
}

impl SheetRecord for Plain3 {
    fn cell_fields() -> Vec<SpecFieldDescriptor> {
        vec![
            SpecFieldDescriptor::new(2, "c"),
            SpecFieldDescriptor::new(0, "a"),
            SpecFieldDescriptor::new(1, "b"),
        ]
    }

    fn cell_value(&self, field: &SpecFieldDescriptor) -> Result<Option<String>> {
        Ok(Some(format!("{}{}", field.key, self.id)))
    }
}

/// Student row: four 2-row headers plus a `grades` group over three subjects.
#[derive(Debug, Clone)]
pub struct Student {
    pub no: usize,
    pub name: String,
    pub age: u32,
    pub sex: String,
    pub lit: f64,
    pub math: f64,
    pub eng: f64,
    /// Makes the `name` lookup fail.
    pub if_broken: bool,
}

impl SheetRecord for Student {
    fn cell_fields() -> Vec<SpecFieldDescriptor> {
        ["no", "name", "age", "sex", "lit", "math", "eng"]
            .iter()
            .enumerate()
            .map(|(idx, name)| SpecFieldDescriptor::new(idx, *name))
            .collect()
    }

    fn header_fields() -> Vec<EnumHeaderField> {
        let mut l_headers: Vec<EnumHeaderField> = ["no", "name", "age", "sex"]
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                EnumHeaderField::Single(SpecFieldDescriptor::new(idx, *name).with_span(2, 1))
            })
            .collect();
        l_headers.push(EnumHeaderField::Group(vec![
            SpecFieldDescriptor::new(4, "grades").with_span(1, 3),
            SpecFieldDescriptor::new(5, "lit").with_parent(4),
            SpecFieldDescriptor::new(6, "math").with_parent(4),
            SpecFieldDescriptor::new(7, "eng").with_parent(4),
        ]));
        l_headers
    }

    fn cell_value(&self, field: &SpecFieldDescriptor) -> Result<Option<String>> {
        let value = match field.key.as_str() {
            "no" => self.no.to_string(),
            "name" if self.if_broken => {
                return Err(GridError::FieldAccess {
                    field: field.key.clone(),
                    message: "lookup failed".to_string(),
                });
            }
            "name" => self.name.clone(),
            "age" => self.age.to_string(),
            "sex" => self.sex.clone(),
            "lit" => self.lit.to_string(),
            "math" => self.math.to_string(),
            "eng" => self.eng.to_string(),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

pub fn derive_students(n: usize) -> Vec<Student> {
    (0..n)
        .map(|idx| Student {
            no: idx + 1,
            name: format!("stu{idx}"),
            age: 18 + idx as u32 % 3,
            sex: if idx % 2 == 0 { "F" } else { "M" }.to_string(),
            lit: 80.0 + idx as f64,
            math: 90.5,
            eng: 70.0,
            if_broken: false,
        })
        .collect()
}

/// Title spanning 2x7, the student table, and one unsupported module.
#[derive(Debug, Clone)]
pub struct ClassSheet {
    pub title: String,
    pub students: Vec<Student>,
}

impl ClassSheet {
    pub fn new(title: &str, n_students: usize) -> Self {
        Self {
            title: title.to_string(),
            students: derive_students(n_students),
        }
    }
}

impl SheetModel for ClassSheet {
    fn module_fields(&self) -> Vec<SpecFieldDescriptor> {
        vec![
            SpecFieldDescriptor::new(2, "photo"),
            SpecFieldDescriptor::new(1, "students"),
            SpecFieldDescriptor::new(0, "title").with_span(2, 7),
        ]
    }

    fn module_value(&self, field: &SpecFieldDescriptor) -> Result<EnumFieldValue<'_>> {
        Ok(match field.key.as_str() {
            "title" => EnumFieldValue::Text(self.title.clone()),
            "students" => EnumFieldValue::Table(&self.students),
            "photo" => EnumFieldValue::Other("image".to_string()),
            _ => EnumFieldValue::Missing,
        })
    }

    fn measurement(&self) -> Option<SpecMeasurement> {
        Some(SpecMeasurement {
            row_heights: vec![30.0, -1.0],
            col_widths: vec![8, 10],
        })
    }
}
