use log::debug;
use serde::{Deserialize, Serialize};

use crate::ir::{
    Class, ClassId, Field, FieldId, Method, MethodId, Statement, StmtRef, VarId, Variable,
};
use crate::Error;

/// A whole program: the class hierarchy, methods with their bodies, and the
/// designated entry method.
///
/// All entities live in arenas owned by the `Program` and are addressed by
/// copyable ids. Ids from one `Program` must not be used with another.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Program {
    classes: Vec<Class>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    variables: Vec<Variable>,
    entry: Option<MethodId>,
}

impl Program {
    pub fn new() -> Program {
        Program {
            classes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            variables: Vec::new(),
            entry: None,
        }
    }

    /// Adds a class with the given direct superclass and implemented
    /// interfaces, and links it into the hierarchy.
    pub fn add_class<S: Into<String>>(
        &mut self,
        name: S,
        superclass: Option<ClassId>,
        interfaces: Vec<ClassId>,
    ) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        if let Some(superclass) = superclass {
            self.classes[superclass.index()].add_subclass(id);
        }
        for interface in &interfaces {
            self.classes[interface.index()].add_implementor(id);
        }
        self.classes
            .push(Class::new(name.into(), superclass, interfaces, false));
        id
    }

    /// Adds an interface extending the given super-interfaces.
    pub fn add_interface<S: Into<String>>(
        &mut self,
        name: S,
        superinterfaces: Vec<ClassId>,
    ) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        for superinterface in &superinterfaces {
            self.classes[superinterface.index()].add_subinterface(id);
        }
        self.classes
            .push(Class::new(name.into(), None, superinterfaces, true));
        id
    }

    /// Adds a field declared by `class`.
    pub fn add_field<S: Into<String>>(
        &mut self,
        class: ClassId,
        name: S,
        is_static: bool,
    ) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(Field::new(name.into(), class, is_static));
        id
    }

    /// Declares a method on `class`. Parameter variables are created here;
    /// non-static methods also get an implicit receiver variable.
    ///
    /// # Errors
    /// Error if `class` already declares a method with this subsignature.
    pub fn add_method<S: Into<String>>(
        &mut self,
        class: ClassId,
        subsignature: S,
        is_static: bool,
        is_abstract: bool,
        num_parameters: usize,
    ) -> Result<MethodId, Error> {
        let subsignature = subsignature.into();
        let id = MethodId(self.methods.len() as u32);
        if !self.classes[class.index()].add_declared_method(subsignature.clone(), id) {
            return Err(Error::MalformedIr(format!(
                "class {} already declares {}",
                self.classes[class.index()].name(),
                subsignature
            )));
        }
        self.methods
            .push(Method::new(subsignature, class, is_static, is_abstract));
        if !is_static {
            let this = self.add_variable(id, "this");
            self.methods[id.index()].set_this(this);
        }
        for i in 0..num_parameters {
            let parameter = self.add_variable(id, format!("p{}", i));
            self.methods[id.index()].add_parameter(parameter);
        }
        Ok(id)
    }

    /// Adds a local variable to `method`.
    pub fn add_variable<S: Into<String>>(&mut self, method: MethodId, name: S) -> VarId {
        let id = VarId(self.variables.len() as u32);
        self.variables.push(Variable::new(name.into(), method));
        id
    }

    /// Sets the body of `method`, validates its shape, and indexes which
    /// statements use each variable as a base or receiver.
    ///
    /// # Errors
    /// Error if the method is abstract or already has a body, if a
    /// statement references a variable belonging to another method, if a
    /// static field access names an instance field (or vice versa), or if a
    /// call site's receiver does not match its call kind.
    pub fn set_body(&mut self, method: MethodId, body: Vec<Statement>) -> Result<(), Error> {
        if self.methods[method.index()].is_abstract() {
            return Err(Error::MalformedIr(format!(
                "abstract method {} cannot have a body",
                self.methods[method.index()]
            )));
        }
        if !self.methods[method.index()].body().is_empty() {
            return Err(Error::MalformedIr(format!(
                "method {} already has a body",
                self.methods[method.index()]
            )));
        }

        for statement in &body {
            self.validate_statement(method, statement)?;
        }

        let mut return_vars = Vec::new();
        for (index, statement) in body.iter().enumerate() {
            let at = StmtRef::new(method, index);
            match statement {
                Statement::LoadField { base, .. } => {
                    self.variables[base.index()].add_load_field(at)
                }
                Statement::StoreField { base, .. } => {
                    self.variables[base.index()].add_store_field(at)
                }
                Statement::LoadArray { array, .. } => {
                    self.variables[array.index()].add_load_array(at)
                }
                Statement::StoreArray { array, .. } => {
                    self.variables[array.index()].add_store_array(at)
                }
                Statement::Invoke(call_site) => {
                    if let Some(receiver) = call_site.receiver() {
                        self.variables[receiver.index()].add_invoke(at);
                    }
                }
                Statement::Return { value: Some(value) } => {
                    if !return_vars.contains(value) {
                        return_vars.push(*value);
                    }
                }
                Statement::New { .. }
                | Statement::Copy { .. }
                | Statement::LoadStatic { .. }
                | Statement::StoreStatic { .. }
                | Statement::Return { value: None }
                | Statement::Nop => {}
            }
        }

        debug!(
            "set body of {} ({} statements)",
            self.methods[method.index()],
            body.len()
        );
        self.methods[method.index()].set_body(body, return_vars);
        Ok(())
    }

    fn validate_statement(&self, method: MethodId, statement: &Statement) -> Result<(), Error> {
        let check_var = |var: &VarId| -> Result<(), Error> {
            if self.variables[var.index()].method() != method {
                return Err(Error::MalformedIr(format!(
                    "variable {} does not belong to {}",
                    self.variables[var.index()].name(),
                    self.methods[method.index()]
                )));
            }
            Ok(())
        };
        let check_static_field = |field: &FieldId, want: bool| -> Result<(), Error> {
            if self.fields[field.index()].is_static() != want {
                return Err(Error::MalformedIr(format!(
                    "field {} has the wrong staticness for its access",
                    self.fields[field.index()].name()
                )));
            }
            Ok(())
        };

        match statement {
            Statement::New { result, .. } => check_var(result),
            Statement::Copy { result, source } => {
                check_var(result)?;
                check_var(source)
            }
            Statement::LoadStatic { result, field } => {
                check_var(result)?;
                check_static_field(field, true)
            }
            Statement::StoreStatic { field, source } => {
                check_var(source)?;
                check_static_field(field, true)
            }
            Statement::LoadField {
                result,
                base,
                field,
            } => {
                check_var(result)?;
                check_var(base)?;
                check_static_field(field, false)
            }
            Statement::StoreField {
                base,
                field,
                source,
            } => {
                check_var(base)?;
                check_var(source)?;
                check_static_field(field, false)
            }
            Statement::LoadArray { result, array } => {
                check_var(result)?;
                check_var(array)
            }
            Statement::StoreArray { array, source } => {
                check_var(array)?;
                check_var(source)
            }
            Statement::Invoke(call_site) => {
                if call_site.kind().is_instance() != call_site.receiver().is_some() {
                    return Err(Error::MalformedIr(format!(
                        "{} call has the wrong receiver shape",
                        call_site.kind()
                    )));
                }
                if let Some(receiver) = call_site.receiver() {
                    check_var(&receiver)?;
                }
                for argument in call_site.arguments() {
                    check_var(argument)?;
                }
                if let Some(result) = call_site.result() {
                    check_var(&result)?;
                }
                Ok(())
            }
            Statement::Return { value } => match value {
                Some(value) => check_var(value),
                None => Ok(()),
            },
            Statement::Nop => Ok(()),
        }
    }

    /// Designates the program's entry method.
    pub fn set_entry(&mut self, method: MethodId) {
        self.entry = Some(method);
    }

    /// The program's entry method, if one has been designated.
    pub fn entry(&self) -> Option<MethodId> {
        self.entry
    }

    pub fn class(&self, class: ClassId) -> &Class {
        &self.classes[class.index()]
    }

    pub fn field(&self, field: FieldId) -> &Field {
        &self.fields[field.index()]
    }

    pub fn method(&self, method: MethodId) -> &Method {
        &self.methods[method.index()]
    }

    pub fn variable(&self, variable: VarId) -> &Variable {
        &self.variables[variable.index()]
    }

    /// The statement a `StmtRef` names.
    pub fn statement(&self, at: StmtRef) -> &Statement {
        &self.methods[at.method().index()].body()[at.index()]
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn num_methods(&self) -> usize {
        self.methods.len()
    }

    /// All call sites in `method`'s body.
    pub fn call_sites_in(&self, method: MethodId) -> Vec<StmtRef> {
        self.methods[method.index()]
            .body()
            .iter()
            .enumerate()
            .filter(|(_, statement)| matches!(statement, Statement::Invoke(_)))
            .map(|(index, _)| StmtRef::new(method, index))
            .collect()
    }
}
