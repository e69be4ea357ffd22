//! Class-file builder for tests.

use super::{
    ACC_PUBLIC, ACC_STATIC, AttributeInfo, CLINIT, ClassFile, Constant, ConstantPool, MemberInfo,
};

pub(crate) struct ClassBuilder {
    class: ClassFile,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        let mut pool = ConstantPool::default();
        let this_class = push_class(&mut pool, name);
        let super_class = push_class(&mut pool, "java/lang/Object");
        Self {
            class: ClassFile {
                minor_version: 0,
                major_version: 61,
                constant_pool: pool,
                access_flags: ACC_PUBLIC,
                this_class,
                super_class,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn superclass(mut self, name: &str) -> Self {
        self.class.super_class = push_class(&mut self.class.constant_pool, name);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        let index = push_class(&mut self.class.constant_pool, name);
        self.class.interfaces.push(index);
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        let member = self.member(0, name, descriptor, Vec::new());
        self.class.fields.push(member);
        self
    }

    pub fn static_field(mut self, name: &str, descriptor: &str) -> Self {
        let member = self.member(ACC_STATIC, name, descriptor, Vec::new());
        self.class.fields.push(member);
        self
    }

    pub fn method(self, name: &str, descriptor: &str, code: &[u8]) -> Self {
        self.method_with_flags(ACC_PUBLIC, name, descriptor, code)
    }

    pub fn clinit(self, code: &[u8]) -> Self {
        self.method_with_flags(ACC_STATIC, CLINIT, "()V", code)
    }

    pub fn long_constant(mut self, value: u64) -> Self {
        self.class.constant_pool.push(Constant::Long(value)).unwrap();
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.class.to_bytes()
    }

    fn method_with_flags(mut self, flags: u16, name: &str, descriptor: &str, code: &[u8]) -> Self {
        let code_attribute = AttributeInfo {
            name_index: self.class.constant_pool.push_utf8("Code").unwrap(),
            info: code_attribute(code),
        };
        let member = self.member(flags, name, descriptor, vec![code_attribute]);
        self.class.methods.push(member);
        self
    }

    fn member(&mut self, flags: u16, name: &str, descriptor: &str, attributes: Vec<AttributeInfo>) -> MemberInfo {
        let pool = &mut self.class.constant_pool;
        MemberInfo {
            access_flags: flags,
            name_index: pool.push_utf8(name).unwrap(),
            descriptor_index: pool.push_utf8(descriptor).unwrap(),
            attributes,
        }
    }
}

fn push_class(pool: &mut ConstantPool, name: &str) -> u16 {
    let name_index = pool.push_utf8(name).unwrap();
    pool.push(Constant::Class { name_index }).unwrap()
}

/// `Code` attribute payload: max_stack 2, max_locals 1, no handlers.
fn code_attribute(code: &[u8]) -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(&2u16.to_be_bytes());
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&(code.len() as u32).to_be_bytes());
    info.extend_from_slice(code);
    info.extend_from_slice(&0u16.to_be_bytes());
    info.extend_from_slice(&0u16.to_be_bytes());
    info
}
