//! Dataset inspection for engine output files
//!
//! Used to find the variable and dimension names to feed into
//! [`load_field`](crate::netcdf_io::load_field).

use crate::errors::Result;
use netcdf::{AttributeValue, File};

/// Information about a dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Shape and key attributes of a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// Structure of a NetCDF dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub global_attributes: Vec<(String, String)>,
}

/// Collect dimensions, variables and global attributes, sorted by name.
pub fn summarize_dataset(file: &File) -> Result<DatasetSummary> {
    let mut dimensions: Vec<DimensionInfo> = file
        .dimensions()
        .map(|d| DimensionInfo {
            name: d.name().to_string(),
            length: d.len(),
            is_unlimited: d.is_unlimited(),
        })
        .collect();
    dimensions.sort_by(|a, b| a.name.cmp(&b.name));

    let mut variables: Vec<VariableInfo> = file
        .variables()
        .map(|var| VariableInfo {
            name: var.name().to_string(),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            units: text_attribute(var.attribute("units")),
            long_name: text_attribute(var.attribute("long_name")),
        })
        .collect();
    variables.sort_by(|a, b| a.name.cmp(&b.name));

    let mut global_attributes = Vec::new();
    for attr in file.attributes() {
        global_attributes.push((attr.name().to_string(), format_value(&attr.value()?)));
    }

    Ok(DatasetSummary {
        dimensions,
        variables,
        global_attributes,
    })
}

impl DatasetSummary {
    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn print(&self) {
        println!("\n Dimensions");
        println!("==============");
        if self.dimensions.is_empty() {
            println!("   (No dimensions found)");
        }
        for dim in &self.dimensions {
            if dim.is_unlimited {
                println!("    {} = {} (unlimited)", dim.name, dim.length);
            } else {
                println!("    {} = {}", dim.name, dim.length);
            }
        }

        println!("\n Variables");
        println!("=============");
        if self.variables.is_empty() {
            println!("   (No variables found)");
        }
        for var in &self.variables {
            if var.dimensions.is_empty() {
                println!("    {}: scalar", var.name);
            } else {
                let shape: Vec<String> = var.shape.iter().map(ToString::to_string).collect();
                println!(
                    "    {}: [{}] = ({})",
                    var.name,
                    var.dimensions.join(", "),
                    shape.join(" × ")
                );
            }

            let mut key_attrs = Vec::new();
            if let Some(units) = &var.units {
                key_attrs.push(format!("units: {}", units));
            }
            if let Some(long_name) = &var.long_name {
                key_attrs.push(format!("long_name: {}", long_name));
            }
            if !key_attrs.is_empty() {
                println!("      └─ {}", key_attrs.join(", "));
            }
        }

        if !self.global_attributes.is_empty() {
            println!("\n Global Attributes");
            println!("=====================");
            for (name, value) in &self.global_attributes {
                println!("    {}: {}", name, value);
            }
        }

        println!("\n💡 Tip: Use `hsdycore pca --file <nc> --var <variable>` to compute EOFs");
    }
}

fn text_attribute(attr: Option<netcdf::Attribute>) -> Option<String> {
    match attr?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        other => format!("{:?}", other),
    }
}
