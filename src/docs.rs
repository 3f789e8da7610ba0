use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::adjustment::AdjustmentQuery;
use crate::api::advance::{AdvanceDetail, AdvanceQuery, ApproveAdvance};
use crate::api::attendance::{AttendanceQuery, CheckRequest, CreateAttendance, MonthQuery, UpdateAttendance};
use crate::api::holiday::CreateHoliday;
use crate::api::location::{CreateLocation, UpdateLocation};
use crate::api::payroll::{DisburseRequest, PeriodDetail, PeriodQuery};
use crate::api::penalty_rule::{CreatePenaltyRule, UpdatePenaltyRule};
use crate::api::{ActiveQuery, PageQuery};
use crate::model::adjustment::{AdjustmentType, HrAdjustment};
use crate::model::advance::{AdvanceInstallment, AdvanceStatus, AdvanceType, InstallmentStatus, SalaryAdvance};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckMethod};
use crate::model::holiday::PublicHoliday;
use crate::model::location::{CompanyLocation, GeoPosition};
use crate::model::payroll::{PayrollDisbursement, PayrollItem, PayrollPeriod, PayrollStatus};
use crate::model::penalty_rule::{PenaltyRule, PenaltyRuleType};
use crate::model::vault::Vault;
use crate::service::adjustment::NewAdjustment;
use crate::service::advance::NewAdvance;
use crate::service::attendance::AttendanceSummary;
use crate::service::geo::{NearestLocation, ProximityCheck};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cleaning HR API",
        version = "1.0.0",
        description = r#"
## Cleaning company HR core

Attendance, salary advances, HR adjustments and monthly payroll for field workers.

### Key features
- **Attendance**: GPS or manual check-in/out checked against company geofences, monthly summaries
- **Advances**: approval pays out of a vault and schedules monthly installments
- **Adjustments**: bonuses, deductions and penalties settled by the next payroll
- **Payroll**: calculation, approval and partial disbursement from cash vaults

### Security
Every endpoint expects a **JWT Bearer** token issued by the company auth service.
Role gates: HR/Admin for attendance overrides, adjustments and payroll; Admin/Accountant for vaults.

### Response format
`{ "success": bool, "data": ..., "error": code, "message": text }`
"#,
    ),
    paths(
        crate::api::location::list_locations,
        crate::api::location::create_location,
        crate::api::location::update_location,
        crate::api::location::delete_location,
        crate::api::location::validate_location,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::create_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::attendance_summary,

        crate::api::advance::create_advance,
        crate::api::advance::list_advances,
        crate::api::advance::get_advance,
        crate::api::advance::approve_advance,
        crate::api::advance::cancel_advance,

        crate::api::adjustment::create_adjustment,
        crate::api::adjustment::list_adjustments,
        crate::api::adjustment::delete_adjustment,

        crate::api::payroll::calculate_payroll,
        crate::api::payroll::approve_payroll,
        crate::api::payroll::disburse_payroll,
        crate::api::payroll::list_periods,
        crate::api::payroll::get_period,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::deactivate_holiday,

        crate::api::penalty_rule::list_rules,
        crate::api::penalty_rule::create_rule,
        crate::api::penalty_rule::update_rule,
        crate::api::penalty_rule::deactivate_rule,

        crate::api::vault::list_vaults
    ),
    components(
        schemas(
            PageQuery,
            ActiveQuery,
            CompanyLocation,
            GeoPosition,
            CreateLocation,
            UpdateLocation,
            NearestLocation,
            ProximityCheck,
            AttendanceRecord,
            AttendanceStatus,
            CheckMethod,
            CheckRequest,
            CreateAttendance,
            UpdateAttendance,
            AttendanceQuery,
            MonthQuery,
            AttendanceSummary,
            SalaryAdvance,
            AdvanceInstallment,
            AdvanceType,
            AdvanceStatus,
            InstallmentStatus,
            NewAdvance,
            ApproveAdvance,
            AdvanceQuery,
            AdvanceDetail,
            HrAdjustment,
            AdjustmentType,
            NewAdjustment,
            AdjustmentQuery,
            PayrollPeriod,
            PayrollItem,
            PayrollDisbursement,
            PayrollStatus,
            PeriodQuery,
            PeriodDetail,
            DisburseRequest,
            PublicHoliday,
            CreateHoliday,
            PenaltyRule,
            PenaltyRuleType,
            CreatePenaltyRule,
            UpdatePenaltyRule,
            Vault
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Locations", description = "Company sites and geofence checks"),
        (name = "Attendance", description = "Daily attendance ledger"),
        (name = "Advances", description = "Salary advances and installments"),
        (name = "Adjustments", description = "Bonuses, deductions and penalties"),
        (name = "Payroll", description = "Monthly payroll periods"),
        (name = "Holidays", description = "Public holidays"),
        (name = "Penalty rules", description = "Lateness tiers and grace"),
        (name = "Vaults", description = "Cash vaults"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
