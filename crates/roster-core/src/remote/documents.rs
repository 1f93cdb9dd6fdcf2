//! GraphQL documents sent to the directory service

use std::fmt;

const EMPLOYEE_FIELDS: &str = "id userId name email phone age class subjects attendance status";

/// Named operations understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    GetMe,
    GetEmployees,
    GetEmployee,
    CreateEmployee,
    UpdateEmployee,
    UpdateEmployeeStatus,
    DeleteEmployee,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::GetMe => "GetMe",
            Self::GetEmployees => "GetEmployees",
            Self::GetEmployee => "GetEmployee",
            Self::CreateEmployee => "CreateEmployee",
            Self::UpdateEmployee => "UpdateEmployee",
            Self::UpdateEmployeeStatus => "UpdateEmployeeStatus",
            Self::DeleteEmployee => "DeleteEmployee",
        }
    }

    /// Top-level field of the `data` object holding the result
    pub fn root_field(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::GetMe => "me",
            Self::GetEmployees => "employees",
            Self::GetEmployee => "employee",
            Self::CreateEmployee => "createEmployee",
            Self::UpdateEmployee => "updateEmployee",
            Self::UpdateEmployeeStatus => "updateEmployeeStatus",
            Self::DeleteEmployee => "deleteEmployee",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Login
                | Self::CreateEmployee
                | Self::UpdateEmployee
                | Self::UpdateEmployeeStatus
                | Self::DeleteEmployee
        )
    }

    pub fn document(&self) -> String {
        match self {
            Self::Login => "mutation Login($email: String!, $password: String!) { \
                 login(email: $email, password: $password) { token user { id email role } } }"
                .to_string(),
            Self::GetMe => "query GetMe { me { id email role } }".to_string(),
            Self::GetEmployees => format!(
                "query GetEmployees($first: Int, $after: String, \
                 $filter: EmployeeFilterInput, $sort: EmployeeSortInput) {{ \
                 employees(first: $first, after: $after, filter: $filter, sort: $sort) {{ \
                 edges {{ cursor node {{ {} }} }} \
                 pageInfo {{ hasNextPage hasPreviousPage startCursor endCursor }} \
                 totalCount }} }}",
                EMPLOYEE_FIELDS
            ),
            Self::GetEmployee => format!(
                "query GetEmployee($id: ID!) {{ employee(id: $id) {{ {} }} }}",
                EMPLOYEE_FIELDS
            ),
            Self::CreateEmployee => format!(
                "mutation CreateEmployee($input: CreateEmployeeInput!) {{ \
                 createEmployee(input: $input) {{ {} }} }}",
                EMPLOYEE_FIELDS
            ),
            Self::UpdateEmployee => format!(
                "mutation UpdateEmployee($id: ID!, $input: UpdateEmployeeInput!) {{ \
                 updateEmployee(id: $id, input: $input) {{ {} }} }}",
                EMPLOYEE_FIELDS
            ),
            Self::UpdateEmployeeStatus => {
                "mutation UpdateEmployeeStatus($id: ID!, $status: EmploymentStatus!) { \
                 updateEmployeeStatus(id: $id, status: $status) { id status } }"
                    .to_string()
            }
            Self::DeleteEmployee => {
                "mutation DeleteEmployee($id: ID!) { deleteEmployee(id: $id) }".to_string()
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_name_their_operation() {
        for op in [
            Operation::Login,
            Operation::GetMe,
            Operation::GetEmployees,
            Operation::GetEmployee,
            Operation::CreateEmployee,
            Operation::UpdateEmployee,
            Operation::UpdateEmployeeStatus,
            Operation::DeleteEmployee,
        ] {
            let doc = op.document();
            assert!(doc.contains(op.name()), "{} missing name", op);
            assert!(doc.contains(op.root_field()), "{} missing root field", op);
            let keyword = if op.is_mutation() { "mutation" } else { "query" };
            assert!(doc.starts_with(keyword));
        }
    }

    #[test]
    fn test_employee_documents_request_every_field() {
        let doc = Operation::GetEmployees.document();
        for field in EMPLOYEE_FIELDS.split(' ') {
            assert!(doc.contains(field));
        }
        assert!(doc.contains("totalCount"));
    }
}
